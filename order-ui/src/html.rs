//! HTML fragments for the order form.
//!
//! Everything here produces [`Markup`], which can only be built from escaped
//! text, from [`Element`]s, or from other `Markup`. Client-entered strings
//! (merchant links, article properties, names) therefore never reach the page
//! unescaped.

use std::fmt;

use order_core::calculations::FeeSchedule;
use order_core::editor::{OrderEditor, TaskView};
use order_core::money::format_cents;
use order_core::{
    AddCost, Article, Cents, ContactProtocol, CurrencyFormat, DeliveryMethod, Order,
    ShippingCatalog,
};
use rust_decimal::Decimal;

use crate::summary::{SummaryRow, summary_rows};

/// Escapes text for use in element content and quoted attribute values.
///
/// `&` is replaced first so the other entities are not double-escaped.
///
/// ```
/// use order_ui::html::escape;
///
/// assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
///     "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
/// ```
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('`', "&#96;")
}

/// Markup that is safe to insert into a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup showing `text` literally.
    pub fn text(text: &str) -> Self {
        Self(escape(text))
    }

    pub fn push(
        &mut self,
        other: impl Into<Markup>,
    ) {
        self.0.push_str(&other.into().0);
    }

    pub fn push_text(
        &mut self,
        text: &str,
    ) {
        self.0.push_str(&escape(text));
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromIterator<Markup> for Markup {
    fn from_iter<I: IntoIterator<Item = Markup>>(iter: I) -> Self {
        let mut out = Markup::new();
        for m in iter {
            out.push(m);
        }
        out
    }
}

/// Elements that never have content or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta"];

/// Builder for a single HTML element.
///
/// Tag and attribute names are static strings chosen by this crate; attribute
/// values and text children are escaped.
#[derive(Debug, Clone)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, Option<String>)>,
    children: Markup,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Markup::new(),
        }
    }

    pub fn attr(
        mut self,
        name: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.attrs.push((name, Some(value.into())));
        self
    }

    /// Adds a boolean attribute such as `readonly` when `on` is set.
    pub fn flag(
        mut self,
        name: &'static str,
        on: bool,
    ) -> Self {
        if on {
            self.attrs.push((name, None));
        }
        self
    }

    pub fn child(
        mut self,
        child: impl Into<Markup>,
    ) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(
        mut self,
        text: &str,
    ) -> Self {
        self.children.push_text(text);
        self
    }

    pub fn render(self) -> Markup {
        let mut out = String::new();
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
        }
        out.push('>');
        if !VOID_TAGS.contains(&self.tag) {
            out.push_str(self.children.as_str());
            out.push_str("</");
            out.push_str(self.tag);
            out.push('>');
        }
        Markup(out)
    }
}

impl From<Element> for Markup {
    fn from(element: Element) -> Self {
        element.render()
    }
}

/// Amount as an input value: point separator, no suffix, e.g. `"12.90"`.
fn input_amount(amount: Cents) -> String {
    amount.to_decimal().to_string()
}

fn input(
    name: &'static str,
    value: impl Into<String>,
    read_only: bool,
) -> Element {
    Element::new("input")
        .attr("class", "form-control")
        .attr("name", name)
        .attr("value", value)
        .flag("readonly", read_only)
}

fn amount_input(
    name: &'static str,
    amount: Cents,
    read_only: bool,
) -> Element {
    input(name, input_amount(amount), read_only)
        .attr("type", "number")
        .attr("step", "0.01")
}

fn label_cell(text: &str) -> Element {
    Element::new("td")
        .attr("colspan", "4")
        .attr("style", "text-align: right")
        .text(text)
}

fn article_row(
    key: impl fmt::Display,
    article: &Article,
    line_total: Option<Cents>,
    read_only: bool,
    format: &CurrencyFormat,
) -> Markup {
    let mut row = Element::new("tr")
        .attr("name", "article")
        .attr("id", key.to_string());
    if !read_only {
        row = row.attr("draggable", "true");
    }
    row.child(Element::new("td").child(input("link", article.link.as_str(), read_only)))
        .child(Element::new("td").child(input(
            "properties",
            article.properties.as_str(),
            read_only,
        )))
        .child(
            Element::new("td").child(
                input("quantity", article.quantity.to_string(), read_only)
                    .attr("type", "number")
                    .attr("step", "1"),
            ),
        )
        .child(Element::new("td").child(amount_input("price", article.price, read_only)))
        .child(
            Element::new("td")
                .attr("name", "sum")
                .text(&line_total.map_or_else(String::new, |t| format_cents(t, format))),
        )
        .render()
}

fn add_cost_row(
    add_cost: &AddCost,
    read_only: bool,
) -> Markup {
    Element::new("tr")
        .attr("name", "add-cost")
        .child(
            Element::new("td")
                .attr("colspan", "4")
                .child(input("name", add_cost.name.as_str(), read_only)),
        )
        .child(Element::new("td").child(amount_input("price", add_cost.price, read_only)))
        .render()
}

fn amount_row(
    label: Markup,
    name: &'static str,
    amount: Cents,
    format: &CurrencyFormat,
) -> Markup {
    Element::new("tr")
        .child(
            Element::new("td")
                .attr("colspan", "4")
                .attr("style", "text-align: right")
                .child(label),
        )
        .child(
            Element::new("td")
                .attr("name", name)
                .text(&format_cents(amount, format)),
        )
        .render()
}

/// Label of the fee row, e.g. `"+ Service fee (12,90 Euro + 2 % of the subtotal)"`.
pub fn fee_label(
    schedule: &FeeSchedule,
    format: &CurrencyFormat,
) -> String {
    let percent = (schedule.share * Decimal::ONE_HUNDRED).normalize();
    format!(
        "+ Service fee ({} + {percent} % of the subtotal)",
        format_cents(schedule.base, format)
    )
}

/// Renders one task block.
///
/// Article rows carry their row key as `id` and are draggable unless the task
/// is read-only. The footer rows show the task's subtotal, fee and total.
pub fn render_task(
    view: &TaskView<'_>,
    schedule: &FeeSchedule,
    format: &CurrencyFormat,
) -> Markup {
    let task = view.task;
    let read_only = view.read_only;

    let header = Element::new("h2").text(&format!("Task {}", view.number));

    let merchant = Element::new("div")
        .attr("class", "form-group")
        .child(Element::new("label").text("Link to the merchant"))
        .child(input("merchant", task.merchant.as_str(), read_only).attr("type", "text"));

    let head = Element::new("thead").child(
        ["Link or article number", "Properties", "Quantity", "Unit price", "Line total"]
            .iter()
            .map(|h| Element::new("th").text(h).render())
            .fold(Element::new("tr"), Element::child),
    );

    let mut body: Markup = task
        .articles
        .iter()
        .zip(view.article_keys)
        .zip(&view.totals.line_totals)
        .map(|((article, key), line_total)| {
            article_row(key, article, *line_total, read_only, format)
        })
        .collect();

    body.push(
        Element::new("tr")
            .attr("id", format!("footer-{}", view.number))
            .child(label_cell("Shipping and packaging"))
            .child(Element::new("td").child(amount_input(
                "shipping-fee",
                task.shipping_fee,
                read_only,
            ))),
    );
    for add_cost in &task.add_costs {
        body.push(add_cost_row(add_cost, read_only));
    }
    body.push(amount_row(
        Element::new("strong").text("Subtotal").render(),
        "task-sum",
        view.totals.subtotal,
        format,
    ));
    body.push(amount_row(
        Markup::text(&fee_label(schedule, format)),
        "store-fee",
        view.totals.fee,
        format,
    ));
    body.push(amount_row(
        Element::new("strong").text("= Total").render(),
        "overall-sum",
        view.totals.total,
        format,
    ));

    Element::new("div")
        .attr("class", "task")
        .attr("data-task", view.number.to_string())
        .attr("id", view.key.to_string())
        .child(header)
        .child(
            Element::new("input")
                .attr("type", "hidden")
                .attr("name", "id")
                .attr("value", task.id.as_str()),
        )
        .child(merchant)
        .child(
            Element::new("table")
                .attr("class", "table")
                .child(head)
                .child(Element::new("tbody").child(body)),
        )
        .render()
}

fn summary_cell(
    amount: Option<Cents>,
    strong: bool,
    format: &CurrencyFormat,
) -> Element {
    let text = amount.map_or_else(String::new, |a| format_cents(a, format));
    if strong {
        Element::new("td").child(Element::new("strong").text(&text))
    } else {
        Element::new("td").text(&text)
    }
}

fn summary_row(
    row: &SummaryRow,
    format: &CurrencyFormat,
) -> Markup {
    let strong = row.is_grand_total();
    let label = if strong {
        Element::new("td").child(Element::new("strong").text(&row.label))
    } else {
        Element::new("td").text(&row.label)
    };
    Element::new("tr")
        .child(label)
        .child(summary_cell(row.subtotal, strong, format))
        .child(summary_cell(row.fee, strong, format))
        .child(summary_cell(Some(row.total), strong, format))
        .render()
}

/// Renders the summary table: one row per task, the reshipping row for
/// shipped orders, and the grand total.
pub fn render_summary(
    editor: &OrderEditor,
    format: &CurrencyFormat,
) -> Markup {
    let head = ["", "Subtotal", "Fee", "Total"]
        .iter()
        .map(|h| Element::new("th").text(h).render())
        .fold(Element::new("tr"), Element::child);

    let body: Markup = summary_rows(editor)
        .iter()
        .map(|row| summary_row(row, format))
        .collect();

    Element::new("table")
        .attr("class", "table")
        .attr("id", "summary")
        .child(Element::new("thead").child(head))
        .child(Element::new("tbody").attr("id", "summary-tbody").child(body))
        .render()
}

fn text_field(
    name: &'static str,
    label: &str,
    value: &str,
) -> Markup {
    Element::new("div")
        .attr("class", "form-group")
        .child(Element::new("label").text(label))
        .child(input(name, value, false).attr("type", "text"))
        .render()
}

fn select<'a>(
    name: &'static str,
    options: impl Iterator<Item = (&'a str, &'a str, Option<Cents>)>,
    selected: &str,
) -> Element {
    options.fold(
        Element::new("select")
            .attr("class", "form-control")
            .attr("name", name),
        |select, (id, label, min_cost)| {
            let mut option = Element::new("option")
                .attr("value", id)
                .flag("selected", id == selected);
            if let Some(min_cost) = min_cost {
                option = option.attr("data-min-cost", min_cost.get().to_string());
            }
            select.child(option.text(label))
        },
    )
}

/// Renders the client and delivery part of the form.
///
/// Selections that are no longer offered stay selectable so stored orders
/// keep their values.
pub fn render_client_section(
    order: &Order,
    catalog: &ShippingCatalog,
    manual_reshipping_fee: Option<Cents>,
) -> Markup {
    let client = &order.client;
    let mut out = Markup::new();

    out.push(text_field("client-name", "Name", &client.client_name));
    out.push(text_field("client-contact", "Contact", &client.client_contact));

    let protocols = ContactProtocol::with_selected(&client.client_contact_protocol);
    out.push(select(
        "client-contact-protocol",
        protocols.iter().map(|p| (p.id.as_str(), p.name.as_str(), None)),
        &client.client_contact_protocol,
    ));

    let radios: Markup = DeliveryMethod::all()
        .iter()
        .map(|method| {
            let id = format!("delivery-method-{}", method.as_str());
            Element::new("div")
                .attr("class", "form-check")
                .child(
                    Element::new("input")
                        .attr("type", "radio")
                        .attr("name", "delivery-method")
                        .attr("id", id.as_str())
                        .attr("value", method.as_str())
                        .flag("checked", order.delivery_method == Some(*method)),
                )
                .child(Element::new("label").attr("for", id).text(method.label()))
                .render()
        })
        .collect();
    out.push(radios);

    let services = catalog.with_selected(&client.shipping_service);
    out.push(select(
        "shipping-service",
        services
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str(), Some(s.min_cost))),
        &client.shipping_service,
    ));

    for (name, label, value) in [
        ("shipping-first-name", "First name", &client.shipping_first_name),
        ("shipping-last-name", "Last name", &client.shipping_last_name),
        (
            "shipping-address-supplement",
            "Address supplement",
            &client.shipping_address_supplement,
        ),
        ("shipping-street", "Street", &client.shipping_street),
        ("shipping-street-number", "Number", &client.shipping_street_number),
        ("shipping-postcode", "Postcode", &client.shipping_postcode),
        ("shipping-town", "Town", &client.shipping_town),
    ] {
        out.push(text_field(name, label, value));
    }

    let reshipping = order.reshipping_fee.or(manual_reshipping_fee);
    out.push(
        Element::new("div")
            .attr("class", "form-group")
            .child(Element::new("label").text("Reshipping fee"))
            .child(amount_input(
                "reshipping-fee",
                reshipping.unwrap_or(Cents::ZERO),
                false,
            )),
    );

    out
}

/// Renders the whole form: client section, task blocks and summary.
///
/// Fee labels come from the schedule the editor computes with.
pub fn render_form(
    editor: &OrderEditor,
    format: &CurrencyFormat,
) -> Markup {
    let schedule = editor.fee_schedule();
    let mut out = Markup::new();
    out.push(render_client_section(
        editor.order(),
        editor.catalog(),
        editor.manual_reshipping_fee(),
    ));
    for view in editor.task_views() {
        out.push(render_task(&view, schedule, format));
    }
    out.push(render_summary(editor, format));
    Element::new("form").attr("method", "post").child(out).render()
}
