//! Editing an order tree.
//!
//! [`OrderEditor`] owns the [`Order`] that the form shows and is the only
//! place it is mutated. Every mutation is followed by a full recomputation of
//! the totals; orders hold a few dozen rows at most, so nothing is cached. A
//! mutation whose totals cannot be computed is rolled back.
//!
//! Tasks and articles are addressed by [`RowKey`]s that the editor hands out
//! when the row is inserted. The presentation layer resolves pointer events to
//! keys (e.g. the row under the cursor on drop) before calling in here.
//!
//! # Example
//!
//! ```
//! use order_core::calculations::{FeeSchedule, TotalsCalculator};
//! use order_core::editor::OrderEditor;
//! use order_core::{Article, Cents, ShippingCatalog, Task};
//!
//! let calculator = TotalsCalculator::new(FeeSchedule::default()).unwrap();
//! let mut editor = OrderEditor::new(calculator, ShippingCatalog::default());
//!
//! let task = editor.add_task(Task::new("https://shop.example")).unwrap();
//! let first = editor.add_article(task, Article::new("a", "", 1, Cents(100))).unwrap();
//! let second = editor.add_article(task, Article::new("b", "", 1, Cents(200))).unwrap();
//!
//! // Drop "b" onto the row of "a".
//! editor.move_article_before(task, second, Some(first)).unwrap();
//!
//! assert_eq!(editor.order().tasks[0].articles[0].link, "b");
//! assert_eq!(editor.totals().tasks[0].subtotal, Cents(300));
//! ```

use thiserror::Error;
use tracing::debug;

use crate::calculations::{
    FeeSchedule, OrderTotals, ReshippingInput, TaskTotals, TotalsCalculator, TotalsError,
};
use crate::ids::{KeyAllocator, RowKey};
use crate::models::{
    AddCost, Article, ClientInfo, DeliveryMethod, MAX_TASKS, Order, ShippingCatalog, Task,
};
use crate::money::Cents;
use crate::payload;

/// Errors returned by [`OrderEditor`] mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("no task with key {0}")]
    UnknownTask(RowKey),

    #[error("no article with key {0}")]
    UnknownArticle(RowKey),

    #[error("article index {index} out of range for {len} articles")]
    ArticleOutOfRange { index: usize, len: usize },

    #[error("add-cost index {index} out of range for {len} add-costs")]
    AddCostOutOfRange { index: usize, len: usize },

    #[error("task {0} is read-only")]
    ReadOnlyTask(u32),

    #[error("an order holds at most {} tasks", MAX_TASKS)]
    TooManyTasks,

    #[error(transparent)]
    Totals(#[from] TotalsError),
}

/// Editor bookkeeping for one task, parallel to `Order::tasks`.
#[derive(Debug, Clone)]
struct TaskEntry {
    key: RowKey,
    number: u32,
    read_only: bool,
    article_keys: Vec<RowKey>,
}

/// Everything the presentation layer needs to draw one task.
#[derive(Debug, Clone, Copy)]
pub struct TaskView<'a> {
    pub key: RowKey,
    /// Display number; never reused within an editor.
    pub number: u32,
    pub read_only: bool,
    pub task: &'a Task,
    /// One key per article, in article order.
    pub article_keys: &'a [RowKey],
    pub totals: &'a TaskTotals,
}

#[derive(Debug)]
pub struct OrderEditor {
    order: Order,
    entries: Vec<TaskEntry>,
    keys: KeyAllocator,
    last_number: u32,
    calculator: TotalsCalculator,
    catalog: ShippingCatalog,
    manual_reshipping_fee: Option<Cents>,
    totals: OrderTotals,
}

impl OrderEditor {
    /// Creates an editor holding an empty order.
    pub fn new(
        calculator: TotalsCalculator,
        catalog: ShippingCatalog,
    ) -> Self {
        Self {
            order: Order::default(),
            entries: Vec::new(),
            keys: KeyAllocator::default(),
            last_number: 0,
            calculator,
            catalog,
            manual_reshipping_fee: None,
            totals: OrderTotals::default(),
        }
    }

    /// Creates an editor for an existing order. All tasks are editable and
    /// numbered from 1 in order.
    pub fn from_order(
        mut order: Order,
        calculator: TotalsCalculator,
        catalog: ShippingCatalog,
    ) -> Result<Self, EditorError> {
        if order.tasks.len() > MAX_TASKS {
            return Err(EditorError::TooManyTasks);
        }
        let tasks = std::mem::take(&mut order.tasks);
        let mut editor = Self::new(calculator, catalog);
        editor.order = order;
        for task in tasks {
            editor.push_task(task, false);
        }
        editor.recompute()?;
        Ok(editor)
    }

    // --- accessors ---

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn into_order(self) -> Order {
        self.order
    }

    /// Totals as of the last mutation.
    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    /// Schedule the service fees are computed with.
    pub fn fee_schedule(&self) -> &FeeSchedule {
        self.calculator.schedule()
    }

    pub fn catalog(&self) -> &ShippingCatalog {
        &self.catalog
    }

    pub fn manual_reshipping_fee(&self) -> Option<Cents> {
        self.manual_reshipping_fee
    }

    /// Key of the task at `index`.
    pub fn task_key(
        &self,
        index: usize,
    ) -> Option<RowKey> {
        self.entries.get(index).map(|e| e.key)
    }

    pub fn task_number(
        &self,
        key: RowKey,
    ) -> Option<u32> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.number)
    }

    /// Tasks with their keys and totals, in order.
    pub fn task_views(&self) -> impl Iterator<Item = TaskView<'_>> {
        self.entries
            .iter()
            .zip(&self.order.tasks)
            .zip(&self.totals.tasks)
            .map(|((entry, task), totals)| TaskView {
                key: entry.key,
                number: entry.number,
                read_only: entry.read_only,
                task,
                article_keys: &entry.article_keys,
                totals,
            })
    }

    // --- tasks ---

    /// Appends an editable task.
    pub fn add_task(
        &mut self,
        task: Task,
    ) -> Result<RowKey, EditorError> {
        self.insert_task(task, false)
    }

    /// Appends a task that can be viewed but not changed or removed.
    pub fn add_read_only_task(
        &mut self,
        task: Task,
    ) -> Result<RowKey, EditorError> {
        self.insert_task(task, true)
    }

    pub fn remove_task(
        &mut self,
        key: RowKey,
    ) -> Result<Task, EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(key)?;
            let entry = this.entries.remove(index);
            debug!(task = entry.number, "removed task");
            Ok(this.order.tasks.remove(index))
        })
    }

    pub fn set_merchant(
        &mut self,
        key: RowKey,
        merchant: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(key)?;
            this.order.tasks[index].merchant = merchant.into();
            Ok(())
        })
    }

    pub fn set_shipping_fee(
        &mut self,
        key: RowKey,
        shipping_fee: Cents,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(key)?;
            this.order.tasks[index].shipping_fee = shipping_fee;
            Ok(())
        })
    }

    // --- articles ---

    /// Appends an article to the task and returns its row key.
    pub fn add_article(
        &mut self,
        task_key: RowKey,
        article: Article,
    ) -> Result<RowKey, EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let key = this.keys.next_key();
            this.entries[index].article_keys.push(key);
            this.order.tasks[index].articles.push(article);
            Ok(key)
        })
    }

    pub fn update_article(
        &mut self,
        task_key: RowKey,
        article_key: RowKey,
        article: Article,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let position = this.article_position(index, article_key)?;
            this.order.tasks[index].articles[position] = article;
            Ok(())
        })
    }

    pub fn remove_article(
        &mut self,
        task_key: RowKey,
        article_key: RowKey,
    ) -> Result<Article, EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let position = this.article_position(index, article_key)?;
            this.entries[index].article_keys.remove(position);
            Ok(this.order.tasks[index].articles.remove(position))
        })
    }

    /// Moves the article at `from` so that it ends up at index `to`.
    pub fn move_article(
        &mut self,
        task_key: RowKey,
        from: usize,
        to: usize,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let len = this.order.tasks[index].articles.len();
            for i in [from, to] {
                if i >= len {
                    return Err(EditorError::ArticleOutOfRange { index: i, len });
                }
            }
            if from != to {
                let articles = &mut this.order.tasks[index].articles;
                let article = articles.remove(from);
                articles.insert(to, article);

                let keys = &mut this.entries[index].article_keys;
                let key = keys.remove(from);
                keys.insert(to, key);

                debug!(task = this.entries[index].number, from, to, "moved article");
            }
            Ok(())
        })
    }

    /// Moves `dragged` to just before `target`, or to the end when there is
    /// no target row (a drop below the last article).
    pub fn move_article_before(
        &mut self,
        task_key: RowKey,
        dragged: RowKey,
        target: Option<RowKey>,
    ) -> Result<(), EditorError> {
        let index = self.editable_task_index(task_key)?;
        let from = self.article_position(index, dragged)?;
        let to = match target {
            Some(target) if target == dragged => from,
            Some(target) => {
                let before = self.article_position(index, target)?;
                if before > from { before - 1 } else { before }
            }
            None => self.order.tasks[index].articles.len() - 1,
        };
        self.move_article(task_key, from, to)
    }

    // --- add-costs ---

    /// Appends an add-cost and returns its index.
    pub fn add_add_cost(
        &mut self,
        task_key: RowKey,
        add_cost: AddCost,
    ) -> Result<usize, EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let add_costs = &mut this.order.tasks[index].add_costs;
            add_costs.push(add_cost);
            Ok(add_costs.len() - 1)
        })
    }

    pub fn update_add_cost(
        &mut self,
        task_key: RowKey,
        position: usize,
        add_cost: AddCost,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let add_costs = &mut this.order.tasks[index].add_costs;
            let len = add_costs.len();
            let slot = add_costs
                .get_mut(position)
                .ok_or(EditorError::AddCostOutOfRange { index: position, len })?;
            *slot = add_cost;
            Ok(())
        })
    }

    pub fn remove_add_cost(
        &mut self,
        task_key: RowKey,
        position: usize,
    ) -> Result<AddCost, EditorError> {
        self.transact(|this| {
            let index = this.editable_task_index(task_key)?;
            let add_costs = &mut this.order.tasks[index].add_costs;
            if position >= add_costs.len() {
                return Err(EditorError::AddCostOutOfRange {
                    index: position,
                    len: add_costs.len(),
                });
            }
            Ok(add_costs.remove(position))
        })
    }

    // --- order level ---

    pub fn set_client(
        &mut self,
        client: ClientInfo,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            this.order.client = client;
            Ok(())
        })
    }

    pub fn set_delivery_method(
        &mut self,
        method: Option<DeliveryMethod>,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            this.order.delivery_method = method;
            Ok(())
        })
    }

    pub fn set_shipping_service(
        &mut self,
        service_id: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            this.order.client.shipping_service = service_id.into();
            Ok(())
        })
    }

    /// Sets the reshipping fee stored with the order.
    pub fn set_reshipping_fee(
        &mut self,
        fee: Option<Cents>,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            this.order.reshipping_fee = fee;
            Ok(())
        })
    }

    /// Sets the reshipping fee typed into the form. Only counts when it
    /// exceeds the otherwise applicable fee.
    pub fn set_manual_reshipping_fee(
        &mut self,
        fee: Option<Cents>,
    ) -> Result<(), EditorError> {
        self.transact(|this| {
            this.manual_reshipping_fee = fee;
            Ok(())
        })
    }

    /// Gives every task without an id a fresh one.
    pub fn assign_missing_ids(&mut self) -> usize {
        payload::assign_missing_ids(&mut self.order)
    }

    // --- internals ---

    fn insert_task(
        &mut self,
        task: Task,
        read_only: bool,
    ) -> Result<RowKey, EditorError> {
        if self.order.tasks.len() >= MAX_TASKS {
            return Err(EditorError::TooManyTasks);
        }
        self.transact(|this| Ok(this.push_task(task, read_only)))
    }

    /// Applies `mutate` and recomputes the totals. On any error the order
    /// and its bookkeeping are restored, so the totals always describe the
    /// current order. Row keys handed out meanwhile are not reused.
    fn transact<T>(
        &mut self,
        mutate: impl FnOnce(&mut Self) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let order = self.order.clone();
        let entries = self.entries.clone();
        let last_number = self.last_number;
        let manual_reshipping_fee = self.manual_reshipping_fee;

        let result = match mutate(self) {
            Ok(value) => self.recompute().map(|()| value),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.order = order;
            self.entries = entries;
            self.last_number = last_number;
            self.manual_reshipping_fee = manual_reshipping_fee;
        }
        result
    }

    fn push_task(
        &mut self,
        task: Task,
        read_only: bool,
    ) -> RowKey {
        self.last_number += 1;
        let key = self.keys.next_key();
        let article_keys = task.articles.iter().map(|_| self.keys.next_key()).collect();
        debug!(task = self.last_number, read_only, "added task");
        self.entries.push(TaskEntry {
            key,
            number: self.last_number,
            read_only,
            article_keys,
        });
        self.order.tasks.push(task);
        key
    }

    fn task_index(
        &self,
        key: RowKey,
    ) -> Result<usize, EditorError> {
        self.entries
            .iter()
            .position(|e| e.key == key)
            .ok_or(EditorError::UnknownTask(key))
    }

    fn editable_task_index(
        &self,
        key: RowKey,
    ) -> Result<usize, EditorError> {
        let index = self.task_index(key)?;
        let entry = &self.entries[index];
        if entry.read_only {
            return Err(EditorError::ReadOnlyTask(entry.number));
        }
        Ok(index)
    }

    fn article_position(
        &self,
        task_index: usize,
        article_key: RowKey,
    ) -> Result<usize, EditorError> {
        self.entries[task_index]
            .article_keys
            .iter()
            .position(|k| *k == article_key)
            .ok_or(EditorError::UnknownArticle(article_key))
    }

    fn recompute(&mut self) -> Result<(), EditorError> {
        let reshipping = ReshippingInput::for_order(&self.order, &self.catalog)
            .with_manual_entry(self.manual_reshipping_fee);
        self.totals = self.calculator.calculate(&self.order, &reshipping)?;
        Ok(())
    }
}
