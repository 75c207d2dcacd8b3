//! Net present value and its rate derivative over normalized flows

use crate::cashflow::NormalizedFlow;

/// NPV(r) = Σ amount · (1 + r)^(-years)
pub fn npv(flows: &[NormalizedFlow], rate: f64) -> f64 {
    let base = 1.0 + rate;
    flows
        .iter()
        .map(|f| f.amount * base.powf(-f.years_from_start))
        .sum()
}

/// dNPV/dr = Σ -years · amount · (1 + r)^(-years - 1)
pub fn npv_derivative(flows: &[NormalizedFlow], rate: f64) -> f64 {
    let base = 1.0 + rate;
    flows
        .iter()
        .map(|f| -f.years_from_start * f.amount * base.powf(-f.years_from_start - 1.0))
        .sum()
}

/// NPV and its derivative in a single pass
pub fn npv_and_derivative(flows: &[NormalizedFlow], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for f in flows {
        let discount = base.powf(-f.years_from_start);
        npv += f.amount * discount;
        dnpv -= f.years_from_start * f.amount * discount / base;
    }

    (npv, dnpv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn one_year(outflow: f64, inflow: f64) -> Vec<NormalizedFlow> {
        vec![NormalizedFlow::new(0.0, outflow), NormalizedFlow::new(1.0, inflow)]
    }

    #[test]
    fn test_npv_zero_at_exact_rate() {
        let flows = one_year(-1000.0, 1100.0);
        assert!(npv(&flows, 0.10).abs() < 1e-9);
        assert!(npv(&flows, 0.05) > 0.0);
        assert!(npv(&flows, 0.15) < 0.0);
    }

    #[test]
    fn test_npv_at_zero_rate_is_undiscounted_sum() {
        let flows = vec![
            NormalizedFlow::new(0.0, -500.0),
            NormalizedFlow::new(0.4, 120.0),
            NormalizedFlow::new(2.7, 600.0),
        ];
        assert_relative_eq!(npv(&flows, 0.0), 220.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_pass_matches_separate_functions() {
        let flows = vec![
            NormalizedFlow::new(0.0, -1000.0),
            NormalizedFlow::new(0.25, 50.0),
            NormalizedFlow::new(1.5, -200.0),
            NormalizedFlow::new(3.1, 1400.0),
        ];

        for &rate in &[-0.5, 0.0, 0.07, 0.3, 4.0] {
            let (v, d) = npv_and_derivative(&flows, rate);
            assert_relative_eq!(v, npv(&flows, rate), max_relative = 1e-12);
            assert_relative_eq!(d, npv_derivative(&flows, rate), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let flows = one_year(-1000.0, 1150.0);
        let rate = 0.12;
        let h = 1e-6;
        let numeric = (npv(&flows, rate + h) - npv(&flows, rate - h)) / (2.0 * h);
        assert_relative_eq!(npv_derivative(&flows, rate), numeric, max_relative = 1e-6);
    }
}
