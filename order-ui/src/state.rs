//! A form session: the editor for one order plus the configuration it is
//! shown with.

use order_core::editor::{EditorError, OrderEditor};
use order_core::ids::RowKey;
use order_core::money::{parse_cents_or_zero_with, parse_cents_with, parse_quantity};
use order_core::payload::{PayloadError, from_payload, to_payload};
use order_core::{AddCost, Article, CurrencyFormat};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AppConfig, ConfigError};
use crate::html::{self, Markup};
use crate::text;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Raw values of an article row as typed into the form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleInput<'a> {
    pub link: &'a str,
    pub properties: &'a str,
    pub quantity: &'a str,
    pub price: &'a str,
}

impl ArticleInput<'_> {
    /// Missing or unparseable numbers read as zero. The price is read in
    /// `format`.
    pub fn to_article(
        &self,
        format: &CurrencyFormat,
    ) -> Article {
        Article::new(
            self.link.trim(),
            self.properties.trim(),
            parse_quantity(self.quantity),
            parse_cents_or_zero_with(self.price, format),
        )
    }
}

#[derive(Debug)]
pub struct FormSession {
    config: AppConfig,
    editor: OrderEditor,
}

impl FormSession {
    /// Starts a session with an empty order.
    pub fn new(config: AppConfig) -> Result<Self, SessionError> {
        let editor = OrderEditor::new(config.calculator()?, config.shipping_services.clone());
        Ok(Self { config, editor })
    }

    /// Replaces the current order with the one in `payload`.
    ///
    /// On error the current order is kept.
    pub fn load_payload(
        &mut self,
        payload: &str,
    ) -> Result<(), SessionError> {
        let order = from_payload(payload)?;
        let tasks = order.tasks.len();
        self.editor = OrderEditor::from_order(
            order,
            self.config.calculator()?,
            self.config.shipping_services.clone(),
        )?;
        info!(tasks, "loaded order");
        Ok(())
    }

    /// Prepares the order for submission: tasks without an id get one, then
    /// the order is serialized.
    pub fn submit_payload(&mut self) -> Result<String, SessionError> {
        let assigned = self.editor.assign_missing_ids();
        debug!(assigned, "prepared submit");
        Ok(to_payload(self.editor.order())?)
    }

    /// Applies an edited article row.
    pub fn update_article_input(
        &mut self,
        task: RowKey,
        article: RowKey,
        input: &ArticleInput<'_>,
    ) -> Result<(), SessionError> {
        let edited = input.to_article(&self.config.currency);
        Ok(self.editor.update_article(task, article, edited)?)
    }

    pub fn set_shipping_fee_input(
        &mut self,
        task: RowKey,
        input: &str,
    ) -> Result<(), SessionError> {
        let fee = parse_cents_or_zero_with(input, &self.config.currency);
        Ok(self.editor.set_shipping_fee(task, fee)?)
    }

    pub fn update_add_cost_input(
        &mut self,
        task: RowKey,
        position: usize,
        name: &str,
        price: &str,
    ) -> Result<(), SessionError> {
        let price = parse_cents_or_zero_with(price, &self.config.currency);
        let add_cost = AddCost::new(name.trim(), price);
        Ok(self.editor.update_add_cost(task, position, add_cost)?)
    }

    /// Applies the reshipping fee field. Empty or unparseable input clears
    /// the manual entry.
    pub fn set_reshipping_entry(
        &mut self,
        input: &str,
    ) -> Result<(), SessionError> {
        let fee = parse_cents_with(input, &self.config.currency);
        Ok(self.editor.set_manual_reshipping_fee(fee)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn editor(&self) -> &OrderEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut OrderEditor {
        &mut self.editor
    }

    pub fn form_html(&self) -> Markup {
        html::render_form(&self.editor, &self.config.currency)
    }

    pub fn summary_html(&self) -> Markup {
        html::render_summary(&self.editor, &self.config.currency)
    }

    pub fn summary_text(&self) -> String {
        text::summary_text(&self.editor, &self.config.currency)
    }
}

#[cfg(test)]
mod tests {
    use order_core::ids::is_task_id;
    use order_core::{Cents, Task};
    use pretty_assertions::assert_eq;

    use super::*;

    const PAYLOAD: &str = r#"{
        "client-name": "Alex",
        "delivery-method": "pickup",
        "tasks": [
            {
                "id": "",
                "merchant": "https://shop.example",
                "shipping-fee": 300,
                "articles": [
                    {"link": "a", "properties": "", "quantity": 2, "price": 500}
                ],
                "add-costs": []
            }
        ]
    }"#;

    #[test]
    fn load_payload_computes_totals() {
        let mut session = FormSession::new(AppConfig::default()).unwrap();

        session.load_payload(PAYLOAD).unwrap();

        assert_eq!(session.editor().order().client.client_name, "Alex");
        assert_eq!(session.editor().totals().total, Cents(2616));
    }

    #[test]
    fn load_payload_keeps_order_on_error() {
        let mut session = FormSession::new(AppConfig::default()).unwrap();
        session.load_payload(PAYLOAD).unwrap();

        let err = session.load_payload("{not json").unwrap_err();

        assert!(matches!(err, SessionError::Payload(PayloadError::Json(_))));
        assert_eq!(session.editor().order().tasks.len(), 1);
    }

    #[test]
    fn submit_payload_assigns_ids() {
        let mut session = FormSession::new(AppConfig::default()).unwrap();
        session.load_payload(PAYLOAD).unwrap();

        let payload = session.submit_payload().unwrap();
        let submitted = from_payload(&payload).unwrap();

        assert!(is_task_id(&submitted.tasks[0].id));
        assert_eq!(submitted.tasks[0].articles, session.editor().order().tasks[0].articles);
    }

    #[test]
    fn edits_show_up_in_summaries() {
        let config = AppConfig::from_toml_str("[currency]\nsuffix = \"EUR\"\n").unwrap();
        let mut session = FormSession::new(config).unwrap();
        let editor = session.editor_mut();
        let task = editor.add_task(Task::new("m")).unwrap();
        editor
            .add_article(task, Article::new("a", "", 1, Cents(1000)))
            .unwrap();

        assert!(session.summary_text().contains("Task 1: m"));
        assert!(session.summary_html().as_str().contains("23,10 EUR"));
        assert!(session.form_html().as_str().contains("data-task=\"1\""));
    }

    // =========================================================================
    // form input tests
    // =========================================================================

    fn session_with_article() -> (FormSession, RowKey, RowKey) {
        let mut session = FormSession::new(AppConfig::default()).unwrap();
        let editor = session.editor_mut();
        let task = editor.add_task(Task::new("m")).unwrap();
        let article = editor.add_article(task, Article::default()).unwrap();
        (session, task, article)
    }

    #[test]
    fn article_input_parses_form_values() {
        let (mut session, task, article) = session_with_article();

        session
            .update_article_input(
                task,
                article,
                &ArticleInput {
                    link: " https://shop.example/p/1 ",
                    properties: "blue",
                    quantity: "3",
                    price: "2,50 Euro",
                },
            )
            .unwrap();

        let stored = &session.editor().order().tasks[0].articles[0];
        assert_eq!(stored.link, "https://shop.example/p/1");
        assert_eq!(stored.quantity, 3);
        assert_eq!(stored.price, Cents(250));
        assert_eq!(session.editor().totals().tasks[0].subtotal, Cents(750));
    }

    #[test]
    fn unparseable_input_counts_as_zero() {
        let (mut session, task, article) = session_with_article();

        session
            .update_article_input(
                task,
                article,
                &ArticleInput {
                    quantity: "lots",
                    price: "5",
                    ..Default::default()
                },
            )
            .unwrap();
        session.set_shipping_fee_input(task, "n/a").unwrap();

        let totals = &session.editor().totals().tasks[0];
        assert_eq!(totals.line_totals, vec![None]);
        assert_eq!(totals.subtotal, Cents::ZERO);
        assert_eq!(totals.fee, Cents(1290));
    }

    #[test]
    fn add_cost_input_accepts_discounts() {
        let (mut session, task, _) = session_with_article();
        session
            .editor_mut()
            .add_add_cost(task, AddCost::new("", Cents::ZERO))
            .unwrap();

        session
            .update_add_cost_input(task, 0, " voucher ", "-10,00")
            .unwrap();

        assert_eq!(
            session.editor().order().tasks[0].add_costs[0],
            AddCost::new("voucher", Cents(-1000))
        );
    }

    #[test]
    fn reshipping_entry_clears_on_empty_input() {
        let mut session = FormSession::new(AppConfig::default()).unwrap();

        session.set_reshipping_entry("12,00").unwrap();
        assert_eq!(session.editor().manual_reshipping_fee(), Some(Cents(1200)));

        session.set_reshipping_entry("").unwrap();
        assert_eq!(session.editor().manual_reshipping_fee(), None);
    }

    #[test]
    fn inputs_are_read_in_the_configured_currency() {
        let config =
            AppConfig::from_toml_str("[currency]\ndecimal_separator = \".\"\nsuffix = \"$\"\n")
                .unwrap();
        let mut session = FormSession::new(config).unwrap();
        let editor = session.editor_mut();
        let task = editor.add_task(Task::new("m")).unwrap();
        let article = editor.add_article(task, Article::default()).unwrap();

        session
            .update_article_input(
                task,
                article,
                &ArticleInput {
                    quantity: "2",
                    price: "2.50 $",
                    ..Default::default()
                },
            )
            .unwrap();
        session.set_shipping_fee_input(task, "1.25 $").unwrap();
        session.set_reshipping_entry("12.00 $").unwrap();

        assert_eq!(session.editor().order().tasks[0].articles[0].price, Cents(250));
        assert_eq!(session.editor().order().tasks[0].shipping_fee, Cents(125));
        assert_eq!(session.editor().manual_reshipping_fee(), Some(Cents(1200)));
    }

    #[test]
    fn oversized_quantity_is_rejected_and_order_kept() {
        let (mut session, task, article) = session_with_article();

        let err = session
            .update_article_input(
                task,
                article,
                &ArticleInput {
                    quantity: "9223372036854775807",
                    price: "0,02",
                    ..Default::default()
                },
            )
            .unwrap_err();
        session.editor_mut().add_task(Task::new("next")).unwrap();

        assert!(matches!(err, SessionError::Editor(EditorError::Totals(_))));
        assert_eq!(session.editor().order().tasks[0].articles[0], Article::default());
        assert_eq!(
            session.editor().order().tasks.len(),
            session.editor().totals().tasks.len()
        );
        assert!(session.summary_text().contains("Task 2: next"));
    }
}
