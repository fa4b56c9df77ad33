//! Print pricing
//!
//! One sheet holds two printed sides, and each side can carry several PDF
//! pages ("slides per page"). Prices are per sheet and depend on whether the
//! job is black & white or colour.

use serde::{Deserialize, Serialize};

use crate::error::CloudPrintError;

/// Slides-per-page choices offered to customers
pub const SLIDES_PER_PAGE_OPTIONS: [u32; 3] = [1, 2, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    #[default]
    #[serde(rename = "bw", alias = "blackwhite")]
    BlackWhite,
    Color,
}

/// Per-sheet prices in BDT
///
/// Keys are snake_case in TOML; the camelCase spellings used by the web
/// front end are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    #[serde(alias = "blackWhitePerSheet")]
    pub black_white_per_sheet: f64,
    #[serde(alias = "colorPerSheet")]
    pub color_per_sheet: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            black_white_per_sheet: 1.3,
            color_per_sheet: 2.6,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<(), CloudPrintError> {
        for (name, value) in [
            ("black_white_per_sheet", self.black_white_per_sheet),
            ("color_per_sheet", self.color_per_sheet),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CloudPrintError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn per_sheet(&self, print_type: PrintType) -> f64 {
        match print_type {
            PrintType::BlackWhite => self.black_white_per_sheet,
            PrintType::Color => self.color_per_sheet,
        }
    }
}

/// One PDF in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub page_count: u32,
    #[serde(default)]
    pub print_type: PrintType,
    #[serde(default = "one")]
    pub slides_per_page: u32,
    #[serde(default = "one")]
    pub copies: u32,
}

fn one() -> u32 {
    1
}

impl PrintJob {
    pub fn new(page_count: u32) -> Self {
        Self {
            file_name: None,
            page_count,
            print_type: PrintType::BlackWhite,
            slides_per_page: 1,
            copies: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub sheets: u32,
    pub price_per_sheet: f64,
    pub price_per_copy: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(flatten)]
    pub job: PrintJob,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuote {
    pub items: Vec<LineItem>,
    pub grand_total: f64,
}

/// Physical sheets needed for `total_pages` PDF pages
///
/// `slides_per_page` of 0 is treated as 1.
pub fn calculate_sheets(total_pages: u32, slides_per_page: u32) -> u32 {
    let sides = total_pages.div_ceil(slides_per_page.max(1));
    sides.div_ceil(2)
}

pub fn calculate_pdf_price(job: &PrintJob, pricing: &PricingConfig) -> PriceQuote {
    let sheets = calculate_sheets(job.page_count, job.slides_per_page);
    let price_per_sheet = pricing.per_sheet(job.print_type);
    let price_per_copy = f64::from(sheets) * price_per_sheet;
    let total_price = price_per_copy * f64::from(job.copies);

    PriceQuote {
        sheets,
        price_per_sheet,
        price_per_copy: round_money(price_per_copy),
        total_price: round_money(total_price),
    }
}

pub fn calculate_total_price(jobs: &[PrintJob], pricing: &PricingConfig) -> OrderQuote {
    let items: Vec<LineItem> = jobs
        .iter()
        .map(|job| LineItem {
            job: job.clone(),
            quote: calculate_pdf_price(job, pricing),
        })
        .collect();
    let grand_total = items.iter().map(|item| item.quote.total_price).sum();

    OrderQuote {
        items,
        grand_total: round_money(grand_total),
    }
}

/// Amount in taka with two decimals, e.g. `৳12.50`
pub fn format_price(amount: f64) -> String {
    format!("৳{:.2}", amount)
}

fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: two sides per sheet, so sheets never exceed pages and always cover them
        #[test]
        fn sheets_cover_all_pages(pages in 0u32..10_000, slides in 1u32..=16) {
            let sheets = calculate_sheets(pages, slides);
            prop_assert!(sheets * 2 * slides >= pages);
            prop_assert!(sheets <= pages);
        }

        /// Property: more copies never costs less
        #[test]
        fn total_grows_with_copies(pages in 1u32..500, copies in 1u32..50) {
            let pricing = PricingConfig::default();
            let base = calculate_pdf_price(&PrintJob { copies, ..PrintJob::new(pages) }, &pricing);
            let more = calculate_pdf_price(&PrintJob { copies: copies + 1, ..PrintJob::new(pages) }, &pricing);
            prop_assert!(more.total_price >= base.total_price);
        }
    }
}
