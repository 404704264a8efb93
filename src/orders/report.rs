use chrono::{DateTime, FixedOffset, Utc};

use std::fmt::Display;

use crate::{
    aggregate::{Grouped, Tally},
    fees::FeeBreakdown,
    groups::Groups,
    period::Period,
    usd::Usd,
    window::{LocalDays, Window, Windowed},
};

use super::{select, Order};

/// How many of the latest orders the daily report lists.
pub const RECENT_ORDERS: usize = 5;

pub const NO_ORDERS: &str = "No orders found.";
pub const NO_ORDERS_IN_PERIOD: &str = "No orders found for the selected period.";

/// Revenue, fee and tax totals for a set of orders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sales {
    pub orders: u64,
    pub revenue: Usd,
    pub fees: Usd,
    pub tax: Usd,
    /// Sum of each order's subtotal less its fee.
    pub net: Usd,
}

impl Sales {
    /// Returns fees as a percentage of revenue.
    #[must_use]
    pub fn fee_percent(&self) -> f64 {
        self.fees.percent_of(self.revenue)
    }
}

impl Tally<Order> for Sales {
    fn add(&mut self, order: &Order) {
        let subtotal = order.subtotal();
        let fee = order.fee().total;
        self.orders += 1;
        self.revenue += subtotal;
        self.fees += fee;
        self.tax += order.tax();
        self.net += subtotal - fee;
    }
}

impl Tally<Order> for FeeBreakdown {
    fn add(&mut self, order: &Order) {
        self.add_order(order.subtotal(), order.currency());
    }
}

/// Sales per calendar month, oldest first, with a grand total.
#[derive(Debug)]
pub struct MonthlySales {
    months: Grouped<String, Sales>,
    total: Sales,
}

impl MonthlySales {
    #[must_use]
    pub fn new(orders: &[Order]) -> Self {
        Self {
            months: Grouped::by(orders, Order::month_key),
            total: Sales::of(orders),
        }
    }

    #[must_use]
    pub fn month(&self, month: &str) -> Sales {
        self.months.get(&month.to_string())
    }

    #[must_use]
    pub fn total(&self) -> Sales {
        self.total
    }
}

impl Display for MonthlySales {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<10} {:>7} {:>10} {:>10} {:>10} {:>10} {:>7}",
            "Month", "Orders", "Revenue", "LS Fees", "Tax", "You Keep", "Fee %"
        )?;
        writeln!(f, "{:-<82}", "")?;
        for (month, sales) in self.months.iter() {
            write_month_row(f, month, sales)?;
        }
        writeln!(f, "{:-<82}", "")?;
        write_month_row(f, "TOTAL", &self.total)
    }
}

fn write_month_row(f: &mut std::fmt::Formatter<'_>, label: &str, sales: &Sales) -> std::fmt::Result {
    writeln!(
        f,
        "{label:<10} {:>7} {:>10} {:>10} {:>10} {:>10} {:>6.1}%",
        sales.orders,
        sales.revenue,
        sales.fees,
        sales.tax,
        sales.net,
        sales.fee_percent(),
    )
}

/// Sales per product (or product and variant), highest revenue first.
#[derive(Debug)]
pub struct ProductSales {
    heading: &'static str,
    width: usize,
    max_name: usize,
    products: Grouped<String, Sales>,
}

impl ProductSales {
    /// Groups orders by product name, after applying `groups`.
    #[must_use]
    pub fn by_product(orders: &[Order], groups: &Groups) -> Self {
        Self {
            heading: "Product",
            width: 30,
            max_name: 29,
            products: Grouped::by(orders, |order: &Order| order.product_key(groups)),
        }
    }

    /// Groups orders by product and variant.
    #[must_use]
    pub fn by_variant(orders: &[Order]) -> Self {
        Self {
            heading: "Product + Variant",
            width: 34,
            max_name: 34,
            products: Grouped::by(orders, Order::variant_key),
        }
    }

    /// Returns the products with their sales, highest revenue first.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&String, &Sales)> {
        self.products.ranked_by(|sales| sales.revenue)
    }
}

impl Display for ProductSales {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.width;
        writeln!(f)?;
        writeln!(
            f,
            "{:<width$} {:>7} {:>10} {:>10} {:>10}",
            self.heading, "Orders", "Revenue", "LS Fees", "You Keep"
        )?;
        let rule = width + 42;
        writeln!(f, "{:-<rule$}", "")?;
        for (name, sales) in self.ranked() {
            let name: String = name.chars().take(self.max_name).collect();
            writeln!(
                f,
                "{name:<width$} {:>7} {:>10} {:>10} {:>10}",
                sales.orders, sales.revenue, sales.fees, sales.net
            )?;
        }
        Ok(())
    }
}

/// Sales in each reporting window, plus the latest few orders.
#[derive(Debug)]
pub struct DailySales {
    windows: Windowed<Sales>,
    recent: Vec<Order>,
}

impl DailySales {
    /// Tallies `orders` against the local calendar. With `rolling_days`, the
    /// last row covers that many days; otherwise it covers all time.
    #[must_use]
    pub fn new(orders: &[Order], days: &LocalDays, rolling_days: Option<u32>) -> Self {
        let mut recent: Vec<Order> = orders.to_vec();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_ORDERS);
        Self {
            windows: Windowed::tally(orders, Window::all(rolling_days), days),
            recent,
        }
    }

    #[must_use]
    pub fn get(&self, window: Window) -> Option<&Sales> {
        self.windows.get(window)
    }

    #[must_use]
    pub fn recent(&self) -> &[Order] {
        &self.recent
    }
}

impl Display for DailySales {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<15} {:>7} {:>10} {:>10} {:>10}",
            "Period", "Orders", "Revenue", "LS Fees", "You Keep"
        )?;
        writeln!(f, "{:-<55}", "")?;
        for (window, sales) in self.windows.iter() {
            writeln!(
                f,
                "{window:<15} {:>7} {:>10} {:>10} {:>10}",
                sales.orders, sales.revenue, sales.fees, sales.net
            )?;
        }
        if !self.recent.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recent Orders:")?;
            for order in &self.recent {
                writeln!(
                    f,
                    "  {}  {}  {}",
                    order.created_at.format("%Y-%m-%d"),
                    order.subtotal(),
                    order.product()
                )?;
            }
        }
        Ok(())
    }
}


/// Which tables a sales report shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SalesView {
    /// Monthly table, fee breakdown, then products.
    #[default]
    Summary,
    Fees,
    Products,
    ProductVariants,
    /// Reporting windows over every paid order, ignoring the period. The
    /// last row covers the given number of days, or all time.
    Daily(Option<u32>),
}

/// A complete sales report: the paid orders a view covers, and how to show
/// them.
#[derive(Debug)]
pub struct SalesReport<'a> {
    orders: Vec<Order>,
    view: SalesView,
    period: Period,
    groups: &'a Groups,
    now: DateTime<FixedOffset>,
}

impl<'a> SalesReport<'a> {
    /// Selects the paid orders `view` covers as of `now`, given in the local
    /// offset.
    #[must_use]
    pub fn new<I>(
        orders: I,
        view: SalesView,
        period: Period,
        groups: &'a Groups,
        now: DateTime<FixedOffset>,
    ) -> Self
    where
        I: IntoIterator<Item = Order>,
    {
        let covered = match view {
            SalesView::Daily(_) => Period::AllTime,
            _ => period,
        };
        Self {
            orders: select(orders, covered, now.with_timezone(&Utc)),
            view,
            period,
            groups,
            now,
        }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Display for SalesReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let SalesView::Daily(rolling_days) = self.view {
            if self.is_empty() {
                return writeln!(f, "{NO_ORDERS}");
            }
            writeln!(f, "LemonSqueezy Sales — {}", self.now.format("%Y-%m-%d"))?;
            writeln!(f)?;
            let days = LocalDays::new(self.now);
            return write!(f, "{}", DailySales::new(&self.orders, &days, rolling_days));
        }

        if self.is_empty() {
            return writeln!(f, "{NO_ORDERS_IN_PERIOD}");
        }
        writeln!(
            f,
            "LemonSqueezy Report — {} ({} orders)",
            self.period.label(self.now),
            self.orders.len()
        )?;
        writeln!(f)?;
        match self.view {
            SalesView::Fees => write!(f, "{}", FeeBreakdown::of(&self.orders)),
            SalesView::Products => {
                write!(f, "{}", ProductSales::by_product(&self.orders, self.groups))
            }
            SalesView::ProductVariants => write!(f, "{}", ProductSales::by_variant(&self.orders)),
            SalesView::Summary | SalesView::Daily(_) => {
                write!(f, "{}", MonthlySales::new(&self.orders))?;
                write!(f, "{}", FeeBreakdown::of(&self.orders))?;
                writeln!(f)?;
                write!(f, "{}", ProductSales::by_product(&self.orders, self.groups))
            }
        }
    }
}
