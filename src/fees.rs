use std::fmt::Display;

use crate::usd::Usd;

/// The platform's cut of every order's subtotal.
pub const PLATFORM_RATE: f64 = 0.05;
/// Flat charge per transaction, in dollars.
pub const FLAT_FEE: f64 = 0.50;
/// Surcharge on orders not paid in [`BASE_CURRENCY`].
pub const INTERNATIONAL_RATE: f64 = 0.015;
pub const BASE_CURRENCY: &str = "USD";

/// Price points shown in the fee breakdown's effective rate table.
pub const PRICE_POINTS: [u32; 6] = [5, 10, 15, 20, 30, 50];

/// The estimated processor fee on one order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fee {
    pub total: Usd,
    /// The part of `total` due to the international surcharge.
    pub international: Usd,
}

/// Calculates the estimated fee for an order with the given subtotal.
///
/// The fee is 5% of the subtotal plus a flat $0.50, plus another 1.5% when
/// `currency` is anything other than USD. Nothing is rounded here.
///
/// ```
/// # use sales_report::{fee, Usd};
/// assert_eq!(fee(Usd::from_dollars(100.0), "USD").total, Usd::from_dollars(5.5));
/// assert_eq!(fee(Usd::from_dollars(100.0), "EUR").international, Usd::from_dollars(1.5));
/// ```
#[must_use]
pub fn fee(subtotal: Usd, currency: &str) -> Fee {
    let platform = subtotal * PLATFORM_RATE + Usd::from_dollars(FLAT_FEE);
    let international = if currency == BASE_CURRENCY {
        Usd::ZERO
    } else {
        subtotal * INTERNATIONAL_RATE
    };
    Fee {
        total: platform + international,
        international,
    }
}

/// Returns the domestic fee on a single order of `price`, as a percentage.
#[must_use]
pub fn effective_rate(price: Usd) -> f64 {
    fee(price, BASE_CURRENCY).total.percent_of(price)
}

/// Summarises the fees paid on a set of orders, split into their components.
#[derive(Debug, Default)]
pub struct FeeBreakdown {
    orders: u32,
    revenue: Usd,
    international: Usd,
}

impl FeeBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one order's subtotal to the breakdown.
    pub fn add_order(&mut self, subtotal: Usd, currency: &str) {
        self.orders += 1;
        self.revenue += subtotal;
        self.international += fee(subtotal, currency).international;
    }

    #[must_use]
    pub fn platform(&self) -> Usd {
        self.revenue * PLATFORM_RATE
    }

    #[must_use]
    pub fn flat(&self) -> Usd {
        Usd::from_dollars(FLAT_FEE) * f64::from(self.orders)
    }

    #[must_use]
    pub fn total(&self) -> Usd {
        self.platform() + self.flat() + self.international
    }

    #[must_use]
    pub fn net(&self) -> Usd {
        self.revenue - self.total()
    }

    /// Returns the average order value, if there are any orders.
    #[must_use]
    pub fn average_order(&self) -> Option<Usd> {
        (self.orders > 0).then(|| self.revenue / f64::from(self.orders))
    }
}

impl Display for FeeBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "Fee Breakdown")?;
        writeln!(f, "  Platform cut (5%):            {:>9}", self.platform())?;
        writeln!(
            f,
            "  Per-txn flat ($0.50 x {:<4}):   {:>9}",
            self.orders,
            self.flat()
        )?;
        writeln!(f, "  International (+1.5%):        {:>9}", self.international)?;
        writeln!(f, "                                ---------")?;
        writeln!(f, "  Total fees to LS:             {:>9}", self.total())?;
        writeln!(
            f,
            "  Effective rate:               {:>7.1}%",
            self.total().percent_of(self.revenue)
        )?;
        writeln!(f)?;
        writeln!(f, "  Gross revenue:                {:>9}", self.revenue)?;
        writeln!(f, "  You keep:                     {:>9}", self.net())?;
        if let Some(avg) = self.average_order() {
            writeln!(f)?;
            writeln!(
                f,
                "  Avg order: {avg} -> {:.1}% effective rate",
                effective_rate(avg)
            )?;
            writeln!(f)?;
            writeln!(f, "  Rate at different price points:")?;
            for price in PRICE_POINTS {
                let rate = effective_rate(Usd::from_dollars(f64::from(price)));
                writeln!(f, "    ${price:>3} -> {rate:.1}%")?;
            }
        }
        Ok(())
    }
}
