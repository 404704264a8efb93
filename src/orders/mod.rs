//! Sales analytics from the LemonSqueezy orders API.

use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, info};
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

use crate::{
    client::Client,
    error::ReportError,
    fees::{fee, Fee, BASE_CURRENCY},
    groups::Groups,
    period::Period,
    usd::Usd,
    window::Timestamped,
};

pub mod export;
pub mod report;

pub use export::ExportRow;
pub use report::{DailySales, MonthlySales, ProductSales, Sales, SalesReport, SalesView};

pub const DEFAULT_BASE_URL: &str = "https://api.lemonsqueezy.com";
pub const ORDERS_PATH: &str = "/v1/orders";
pub const JSON_API: &str = "application/vnd.api+json";
/// Orders requested per page. A shorter page is the last one.
pub const PAGE_SIZE: usize = 50;
pub const UNKNOWN_PRODUCT: &str = "Unknown";
pub const DEFAULT_VARIANT: &str = "Default";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Failed,
    Paid,
    Refunded,
    PartialRefund,
    Fraudulent,
    #[default]
    #[serde(other)]
    Unknown,
}

/// The first line item of an order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct OrderItem {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
}

/// One order, as described by the attributes of an orders API resource.
///
/// Amounts are in US cents whatever the currency the customer paid in.
#[serde_as]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Order {
    pub created_at: DateTime<FixedOffset>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub status: OrderStatus,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, rename = "subtotal_usd")]
    pub subtotal_cents: i64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, rename = "tax_usd")]
    pub tax_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub refunded: bool,
    #[serde(default, rename = "first_order_item")]
    pub first_item: Option<OrderItem>,
}

impl Order {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    #[must_use]
    pub fn subtotal(&self) -> Usd {
        Usd::from_cents(self.subtotal_cents)
    }

    #[must_use]
    pub fn tax(&self) -> Usd {
        Usd::from_cents(self.tax_cents)
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(BASE_CURRENCY)
    }

    #[must_use]
    pub fn fee(&self) -> Fee {
        fee(self.subtotal(), self.currency())
    }

    /// Returns what's left of the subtotal after fees.
    #[must_use]
    pub fn net(&self) -> Usd {
        self.subtotal() - self.fee().total
    }

    #[must_use]
    pub fn product(&self) -> &str {
        self.first_item
            .as_ref()
            .and_then(|item| item.product_name.as_deref())
            .unwrap_or(UNKNOWN_PRODUCT)
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        self.first_item
            .as_ref()
            .and_then(|item| item.variant_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_VARIANT)
    }

    /// Grouping key for per-product totals, after applying product groups.
    #[must_use]
    pub fn product_key(&self, groups: &Groups) -> String {
        groups.display_name(self.product())
    }

    /// Grouping key for per-variant totals.
    #[must_use]
    pub fn variant_key(&self) -> String {
        format!("{} | {}", self.product(), self.variant())
    }

    /// Grouping key for monthly totals: the month in the order's own offset.
    #[must_use]
    pub fn month_key(&self) -> String {
        self.created_at.format("%Y-%m").to_string()
    }
}

impl Timestamped for Order {
    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
}

#[derive(Debug, Deserialize)]
struct Resource {
    attributes: Order,
}

/// One page of an orders API response.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct OrdersPage {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    data: Vec<Resource>,
}

impl OrdersPage {
    #[must_use]
    pub fn into_orders(self) -> Vec<Order> {
        self.data.into_iter().map(|r| r.attributes).collect()
    }
}

/// Keeps the paid orders created within `period`.
#[must_use]
pub fn select<I>(orders: I, period: Period, now: DateTime<Utc>) -> Vec<Order>
where
    I: IntoIterator<Item = Order>,
{
    let includes = period.includes(now);
    orders
        .into_iter()
        .filter(|order| order.is_paid() && includes(order.created_at))
        .collect()
}

/// Collects orders from successive pages, starting at page 1, until a page
/// comes back short.
///
/// # Errors
///
/// Returns the first error from `fetch_page`; orders from earlier pages are
/// discarded.
pub fn collect_pages<F>(mut fetch_page: F) -> Result<Vec<Order>, ReportError>
where
    F: FnMut(u32) -> Result<Vec<Order>, ReportError>,
{
    let mut orders = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page)?;
        debug!("page {page}: {} orders", batch.len());
        let last = batch.len() < PAGE_SIZE;
        orders.extend(batch);
        if last {
            return Ok(orders);
        }
        page += 1;
    }
}

/// Fetches a single page of orders.
///
/// # Errors
///
/// Returns any transport, status or decoding error.
pub fn fetch_page(client: &Client, page: u32) -> Result<Vec<Order>, ReportError> {
    let params = [
        ("page[size]", PAGE_SIZE.to_string()),
        ("page[number]", page.to_string()),
    ];
    let page: OrdersPage = client.get_json(ORDERS_PATH, &params, Some(JSON_API))?;
    Ok(page.into_orders())
}

/// Fetches every order, one page at a time.
///
/// # Errors
///
/// Returns the first error from any page.
pub fn fetch_all(client: &Client) -> Result<Vec<Order>, ReportError> {
    let orders = collect_pages(|page| fetch_page(client, page))?;
    info!("fetched {} orders", orders.len());
    Ok(orders)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::client::parse_json;

    use std::fs;

    pub(crate) fn fixture_orders() -> Vec<Order> {
        let body = fs::read_to_string("testdata/orders.json").unwrap();
        parse_json::<OrdersPage>(&body).unwrap().into_orders()
    }

    pub(crate) fn order(created_at: &str, cents: i64, currency: &str) -> Order {
        Order {
            created_at: DateTime::parse_from_rfc3339(created_at).unwrap(),
            status: OrderStatus::Paid,
            subtotal_cents: cents,
            tax_cents: 0,
            currency: Some(currency.into()),
            refunded: false,
            first_item: None,
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-10-17T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn orders_page_parses_json_api_fixture() {
        let orders = fixture_orders();
        assert_eq!(orders.len(), 7);
        assert_eq!(orders[0].subtotal(), Usd::from_cents(1999));
        assert_eq!(orders[0].product(), "SaneBar");
        assert_eq!(orders[0].variant(), "Lifetime");
        assert_eq!(orders[1].currency(), "EUR");
        assert_eq!(orders[5].status, OrderStatus::Refunded);
        assert!(orders[5].refunded);
        assert_eq!(orders[6].status, OrderStatus::Pending);
    }

    #[test]
    fn missing_item_fields_read_as_sentinels() {
        let orders = fixture_orders();
        assert_eq!(orders[1].variant_key(), "SaneBar | Default");
        assert_eq!(orders[3].product(), "Unknown");
        assert_eq!(orders[3].variant_key(), "Unknown | Default");
    }

    #[test]
    fn unrecognised_status_is_not_paid() {
        let order: Order = serde_json::from_str(
            r#"{"created_at": "2026-10-17T00:00:00Z", "status": "on_hold", "subtotal_usd": 100}"#,
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert!(!order.is_paid());
        assert_eq!(order.tax(), Usd::ZERO);
        assert_eq!(order.currency(), "USD");
    }

    #[test]
    fn month_key_fn_uses_the_orders_own_offset() {
        let order = order("2026-10-01T00:30:00+02:00", 100, "USD");
        assert_eq!(order.month_key(), "2026-10");
    }

    #[test]
    fn product_key_fn_applies_product_groups() {
        let mut groups = Groups::new();
        groups.add_group("Everything Sane", "^Sane").unwrap();
        let orders = fixture_orders();
        assert_eq!(orders[2].product_key(&groups), "Everything Sane");
        assert_eq!(orders[3].product_key(&groups), "Unknown");
        assert_eq!(orders[2].product_key(&Groups::new()), "SaneClip");
    }

    #[test]
    fn select_fn_keeps_paid_orders_in_current_month() {
        let selected = select(fixture_orders(), Period::CurrentMonth, now());
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(Order::is_paid));
        assert!(selected.iter().all(|o| o.month_key() == "2026-10"));
    }

    #[test]
    fn select_fn_without_period_keeps_all_paid_orders() {
        assert_eq!(select(fixture_orders(), Period::AllTime, now()).len(), 5);
        assert_eq!(select(fixture_orders(), Period::LastDays(1), now()).len(), 2);
    }

    #[test]
    fn collect_pages_fn_stops_after_short_page() {
        let mut requested = Vec::new();
        let orders = collect_pages(|page| {
            requested.push(page);
            let count = if page < 3 { PAGE_SIZE } else { 3 };
            Ok(vec![order("2026-10-17T00:00:00Z", 100, "USD"); count])
        })
        .unwrap();
        assert_eq!(orders.len(), 2 * PAGE_SIZE + 3);
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[test]
    fn collect_pages_fn_handles_empty_first_page() {
        let orders = collect_pages(|_| Ok(Vec::new())).unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn collect_pages_fn_fails_whole_run_on_bad_page() {
        let result = collect_pages(|page| {
            if page == 2 {
                parse_json::<OrdersPage>("<html>oops</html>").map(OrdersPage::into_orders)
            } else {
                Ok(vec![order("2026-10-17T00:00:00Z", 100, "USD"); PAGE_SIZE])
            }
        });
        assert!(matches!(result, Err(ReportError::MalformedResponse { .. })));
    }
}
