use dealer_common::Cents;

use crate::IntegrationError;

/// Converts a provider decimal amount string ("1250.00") into minor units.
pub fn parse_decimal_amount(value: &str) -> Result<Cents, IntegrationError> {
    value.trim().parse::<Cents>().map_err(|e| IntegrationError::InvalidCurrencyAmount(format!("{value}: {e}")))
}
