use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A quoted delivery option.
///
/// The first option in a returned list is the premium/default choice;
/// a single-option list is implicitly selected by callers rather than
/// presented as a choice of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryOption {
    pub courier: String,
    pub service: String,
    pub fee: Decimal,
    pub estimated_days: String,
}

impl DeliveryOption {
    fn new(courier: &str, service: &str, fee: Decimal, estimated_days: &str) -> Self {
        Self {
            courier: courier.to_string(),
            service: service.to_string(),
            fee,
            estimated_days: estimated_days.to_string(),
        }
    }
}

/// Quotes delivery options for a destination. Pure lookup, no I/O.
///
/// Missing country means Nigeria; a missing or unrecognized Nigerian
/// state falls through to the nationwide courier.
pub fn quote(country: Option<&str>, state: Option<&str>) -> Vec<DeliveryOption> {
    let country = country.map(str::trim).filter(|c| !c.is_empty());
    let is_nigeria = country.map_or(true, |c| c.eq_ignore_ascii_case("nigeria"));

    if !is_nigeria {
        return vec![
            DeliveryOption::new("DHL Express", "International express", dec!(45000), "7-14"),
            DeliveryOption::new("EMS Speedpost", "International standard", dec!(25000), "14-21"),
        ];
    }

    let is_lagos = state
        .map(str::trim)
        .is_some_and(|s| s.eq_ignore_ascii_case("lagos"));

    if is_lagos {
        vec![
            DeliveryOption::new("GIG Logistics", "Same-day dispatch", dec!(3500), "0-1"),
            DeliveryOption::new("Kwik Delivery", "Next-day dispatch", dec!(2500), "1-2"),
        ]
    } else {
        vec![DeliveryOption::new(
            "GIG Logistics",
            "Nationwide door-to-door",
            dec!(4500),
            "3-5",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Nigeria"), Some("Lagos"), 2)]
    #[case(Some("nigeria"), Some("LAGOS"), 2)]
    #[case(Some("Nigeria"), Some("Abuja"), 1)]
    #[case(Some("Nigeria"), Some("Oyo"), 1)]
    #[case(Some("Nigeria"), None, 1)]
    #[case(None, Some("Kano"), 1)]
    #[case(None, Some("Lagos"), 2)]
    #[case(Some("Ghana"), Some("Accra"), 2)]
    #[case(Some("United Kingdom"), None, 2)]
    fn option_counts_by_destination(
        #[case] country: Option<&str>,
        #[case] state: Option<&str>,
        #[case] expected: usize,
    ) {
        assert_eq!(quote(country, state).len(), expected);
    }

    #[test]
    fn lagos_premium_option_comes_first() {
        let options = quote(Some("Nigeria"), Some("Lagos"));
        assert_eq!(options[0].courier, "GIG Logistics");
        assert_eq!(options[0].service, "Same-day dispatch");
        assert!(options[0].fee > options[1].fee);
    }

    #[test]
    fn international_express_comes_first() {
        let options = quote(Some("Ghana"), None);
        assert_eq!(options[0].courier, "DHL Express");
        assert_eq!(options[1].courier, "EMS Speedpost");
        assert_eq!(options[0].estimated_days, "7-14");
        assert_eq!(options[1].estimated_days, "14-21");
    }

    #[test]
    fn quoting_is_deterministic_across_calls() {
        let first = quote(Some("Nigeria"), Some("Lagos"));
        for _ in 0..10 {
            assert_eq!(quote(Some("Nigeria"), Some("Lagos")), first);
        }
    }

    #[test]
    fn nationwide_option_is_the_single_implicit_choice() {
        let options = quote(Some("Nigeria"), Some("Enugu"));
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].service, "Nationwide door-to-door");
        assert_eq!(options[0].estimated_days, "3-5");
    }
}
