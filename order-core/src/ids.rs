//! Identifiers for tasks and editor rows.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters used in task ids. Easily confused letters are left out.
const TASK_ID_ALPHABET: &[u8] = b"ABCDEFGHKLMNPQRSTUVWXYZ";

/// Length of a task id.
pub const TASK_ID_LEN: usize = 10;

/// Generates a fresh random task id such as `"KQXWBMRAZT"`.
pub fn new_task_id() -> String {
    let mut rng = rand::thread_rng();
    (0..TASK_ID_LEN)
        .map(|_| TASK_ID_ALPHABET[rng.gen_range(0..TASK_ID_ALPHABET.len())] as char)
        .collect()
}

/// Whether `s` has the shape of a task id.
pub fn is_task_id(s: &str) -> bool {
    s.len() == TASK_ID_LEN && s.bytes().all(|b| TASK_ID_ALPHABET.contains(&b))
}

/// Identifies a task or article row within one editor.
///
/// Keys are handed out in increasing order and never reused, so a key stays
/// valid for its row across reorderings and removals of other rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(u64);

impl RowKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Hands out increasing [`RowKey`]s.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    pub fn next_key(&mut self) -> RowKey {
        self.next += 1;
        RowKey(self.next)
    }
}
