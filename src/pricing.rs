//! Cost calculation for the payment step.
//!
//! Pure function of the cart snapshot, the chosen shipping method and the
//! store settings. All arithmetic is exact `Decimal`; `total` is always the
//! exact sum of the three components.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::StoreSettings;
use crate::models::{CartSnapshot, CostBreakdown, ShippingMethod};

/// Express shipping costs this multiple of the standard flat rate.
const EXPRESS_MULTIPLIER: Decimal = dec!(2.5);

pub fn compute_totals(
    cart: &CartSnapshot,
    method: ShippingMethod,
    settings: &StoreSettings,
) -> CostBreakdown {
    // A stale zero total with lines present means the cart collaborator left
    // an inconsistent snapshot; rebuild the subtotal from the lines.
    let subtotal = if cart.total_amount <= Decimal::ZERO && !cart.is_empty() {
        cart.recomputed_subtotal()
    } else {
        cart.total_amount.max(Decimal::ZERO)
    };

    let shipping = shipping_cost(subtotal, method, settings);
    let tax = subtotal * settings.tax_rate_percent / dec!(100);

    CostBreakdown {
        subtotal,
        shipping,
        tax,
        total: subtotal + shipping + tax,
    }
}

/// Standard shipping is free once the free-shipping threshold is met;
/// express drops from 2.5x the flat rate to the flat rate.
pub fn shipping_cost(subtotal: Decimal, method: ShippingMethod, settings: &StoreSettings) -> Decimal {
    let over_threshold = subtotal >= settings.free_shipping_threshold;
    match (method, over_threshold) {
        (ShippingMethod::Standard, true) => Decimal::ZERO,
        (ShippingMethod::Standard, false) => settings.flat_shipping_rate,
        (ShippingMethod::Express, true) => settings.flat_shipping_rate,
        (ShippingMethod::Express, false) => settings.flat_shipping_rate * EXPRESS_MULTIPLIER,
    }
}
