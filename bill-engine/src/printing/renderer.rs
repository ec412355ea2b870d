//! Receipt renderers
//!
//! Render [`ReceiptData`], [`KotData`] and menu listings into ESC/POS bytes
//! for 80mm (48 columns) or 58mm (32 columns) thermal paper.

use crate::core::RestaurantInfo;
use crate::utils::money;
use receipt_printer::{EscPosBuilder, truncate_text, wrap_text};
use shared::models::{KotData, MenuItem, PaymentMethod, ReceiptData};
use std::collections::BTreeMap;

/// Address lines wrap at this many columns (or the paper width if smaller)
const ADDRESS_WRAP: usize = 40;

/// Menu items without a category
const UNCATEGORIZED: &str = "Other";

fn rs(amount: f64) -> String {
    format!("Rs.{:.2}", amount)
}

/// Item table column widths: (name, qty, rate, amount)
fn item_columns(width: usize) -> (usize, usize, usize, usize) {
    let (qty, rate, amt) = if width >= 48 { (6, 9, 9) } else { (4, 7, 7) };
    let name = width.saturating_sub(2 + qty + rate + amt);
    (name, qty, rate, amt)
}

/// Customer bill renderer
pub struct BillReceiptRenderer {
    restaurant: RestaurantInfo,
    width: usize,
}

impl BillReceiptRenderer {
    pub fn new(restaurant: RestaurantInfo, width: usize) -> Self {
        Self { restaurant, width }
    }

    pub fn render(&self, receipt: &ReceiptData) -> Vec<u8> {
        self.compose(receipt).build()
    }

    fn compose(&self, receipt: &ReceiptData) -> EscPosBuilder {
        let mut b = EscPosBuilder::new(self.width);

        self.render_header(&mut b, receipt);
        self.render_items(&mut b, receipt);
        self.render_totals(&mut b, receipt);
        self.render_payment(&mut b, receipt);

        // Footer
        b.center();
        b.sep_double();
        b.bold();
        b.line("Thank you! Visit again");
        b.bold_off();
        b.left();
        b.feed(3);
        b.cut_partial();
        b
    }

    fn render_header(&self, b: &mut EscPosBuilder, receipt: &ReceiptData) {
        let info = &self.restaurant;

        b.center();
        b.bold();
        b.line(&info.name);
        b.bold_off();
        b.newline();

        for line in wrap_text(&info.address, ADDRESS_WRAP.min(self.width)) {
            b.line(&line);
        }
        b.line(&format!("Ph: {}", info.phone));
        if let Some(gst) = info.gst.as_deref().filter(|g| !g.is_empty()) {
            b.line(&format!("GST: {}", gst));
        }
        b.newline();

        b.left();
        b.line_lr(&format!("{} {}", receipt.date, receipt.time), &receipt.kind);
        b.sep_double();

        // Bill number block
        b.center();
        b.bold();
        b.double_height();
        b.line(&format!("BILL: {}", receipt.bill_no));
        b.reset_size();
        b.line(&format!("ORDER: {} | KOT: {}", receipt.order_no, receipt.kot_no));
        b.bold_off();
        b.left();
        b.sep_double();

        b.line_lr(
            &format!("Table: {}", receipt.table),
            &format!("User: {}", receipt.user),
        );
        b.sep_single();
    }

    fn render_items(&self, b: &mut EscPosBuilder, receipt: &ReceiptData) {
        let (name_w, qty_w, rate_w, amt_w) = item_columns(self.width);

        b.bold();
        b.columns(&[
            ("ITEM", name_w, false),
            ("QTY", qty_w, true),
            ("RATE", rate_w, true),
            ("AMT", amt_w, true),
        ]);
        b.bold_off();
        b.sep_single();

        for (i, item) in receipt.items.iter().enumerate() {
            let name = truncate_text(&format!("{}.{}", i + 1, item.name), name_w);
            let qty = item.quantity.to_string();
            let rate = format!("{:.2}", item.price);
            let amount = format!(
                "{:.2}",
                money::to_f64(money::line_amount(item.price, item.quantity))
            );
            b.columns(&[
                (&name, name_w, false),
                (&qty, qty_w, true),
                (&rate, rate_w, true),
                (&amount, amt_w, true),
            ]);
        }
        b.sep_single();
    }

    fn render_totals(&self, b: &mut EscPosBuilder, receipt: &ReceiptData) {
        b.line_lr(
            &format!("Items: {}", receipt.total_qty),
            &format!("Subtotal: {}", rs(receipt.subtotal)),
        );
        if receipt.discount_amount > 0.0 {
            b.right();
            b.line(&format!("Discount: -{}", rs(receipt.discount_amount)));
            b.left();
        }
        b.sep_double();

        b.right();
        b.bold();
        b.double_height();
        b.line(&format!("TOTAL: {}", rs(receipt.total_amount)));
        b.reset_size();
        b.bold_off();
        b.left();
    }

    /// Payment lines, only for settled bills
    fn render_payment(&self, b: &mut EscPosBuilder, receipt: &ReceiptData) {
        let Some(method) = receipt.payment_method else {
            return;
        };

        match (&receipt.split_payment, method) {
            (Some(split), PaymentMethod::Split) => {
                b.line("Paid by: Split");
                for m in split.methods() {
                    b.line_lr(&format!("  {}", m.label()), &rs(split.amount(m)));
                }
            }
            _ => {
                b.line(&format!("Paid by: {}", method.label()));
            }
        }
        if let Some(received) = receipt.amount_received {
            b.line_lr("Received:", &rs(received));
        }
        if let Some(change) = receipt.change {
            b.line_lr("Change:", &rs(change));
        }
    }
}

/// Kitchen order ticket renderer
pub struct KotRenderer {
    width: usize,
}

impl KotRenderer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn render(&self, kot: &KotData) -> Vec<u8> {
        self.compose(kot).build()
    }

    fn compose(&self, kot: &KotData) -> EscPosBuilder {
        let mut b = EscPosBuilder::new(self.width);
        let qty_w = 6;
        let name_w = self.width.saturating_sub(qty_w);

        b.center();
        b.bold();
        b.double_size();
        b.line(&format!("KOT - {}", kot.table));
        b.reset_size();
        b.line(&kot.kind);
        b.bold_off();
        b.left();
        b.line_lr(&kot.date, &kot.time);
        b.sep_double();

        b.bold();
        b.columns(&[("ITEM", name_w, false), ("QTY", qty_w, true)]);
        b.bold_off();
        b.sep_single();

        for item in &kot.items {
            let qty = item.quantity.to_string();
            b.double_height();
            b.columns(&[(&item.name, name_w, false), (&qty, qty_w, true)]);
            b.reset_size();
        }

        b.sep_single();
        b.line_lr("Total Qty:", &kot.total_qty.to_string());
        b.feed(3);
        b.cut_partial();
        b
    }
}

/// Menu listing renderer, grouped by category
pub struct MenuListRenderer {
    width: usize,
}

impl MenuListRenderer {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn render(&self, title: &str, items: &[MenuItem]) -> Vec<u8> {
        self.compose(title, items).build()
    }

    fn group_by_category<'a>(&self, items: &'a [MenuItem]) -> BTreeMap<&'a str, Vec<&'a MenuItem>> {
        let mut groups: BTreeMap<&str, Vec<&MenuItem>> = BTreeMap::new();
        for item in items {
            let category = item
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED);
            groups.entry(category).or_default().push(item);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    fn compose(&self, title: &str, items: &[MenuItem]) -> EscPosBuilder {
        let mut b = EscPosBuilder::new(self.width);

        b.center();
        b.bold();
        b.double_height();
        b.line(title);
        b.reset_size();
        b.line("MENU");
        b.bold_off();
        b.left();
        b.sep_double();

        for (category, group) in self.group_by_category(items) {
            b.bold();
            b.line(&format!("[{}]", category));
            b.bold_off();
            for item in group {
                b.line_lr(&item.name, &rs(item.price));
            }
            b.sep_single();
        }

        b.line(&format!("Total Items: {}", items.len()));
        b.feed(3);
        b.cut_partial();
        b
    }
}
