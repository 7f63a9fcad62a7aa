//! Reconciliation driver
//!
//! Walks the set backlog in ascending-id order and runs each set through
//! fetch -> match -> parse -> dedup -> insert, persisting the checkpoint
//! after every set. Strictly sequential: the dedup index must reflect every
//! insert made so far before the next product is evaluated, and the remote
//! provider's rate limit leaves nothing to gain from parallel fetches.

use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::Connection;

use crate::checkpoint::{CheckpointStore, ErrorKind, ImportCheckpoint};
use crate::database::{self, Card, CardSet};
use crate::dedup::DedupIndex;
use crate::error::Result;
use crate::label::parse_label;
use crate::matcher::{filter_matching, MatchConfig};
use crate::pricecharting::{CatalogClient, SearchOutcome, SearchProduct};

/// Progress event emitted once per set, before it is processed
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub set_index: usize,
    pub total_sets: usize,
    pub current_set_name: String,
    pub cards_added_so_far: u64,
}

/// Terminal state of one set's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOutcome {
    /// Matching and inserting finished (zero accepted products also lands
    /// here: an empty match is informational, not an error)
    Done { cards_added: u64 },
    /// Retries exhausted on the search call; recorded, never retried
    /// within the same run
    Failed,
}

/// What one driver invocation accomplished
#[derive(Debug)]
pub struct RunSummary {
    pub sets_processed: usize,
    pub cards_added: u64,
    /// True when a stop request ended the run at a set boundary
    pub stopped: bool,
}

/// Run the reconciliation pipeline across the set backlog.
///
/// Resumes from the loaded checkpoint's cursor; sets before it are complete
/// and never reprocessed. The checkpoint is saved after every set, before
/// the next one starts. `stop` is checked once per set boundary, so an
/// in-flight set always finishes (or fails) cleanly.
pub async fn run_reconciliation(
    conn: &Connection,
    store: &mut dyn CheckpointStore,
    client: &CatalogClient,
    match_config: &MatchConfig,
    limit: Option<usize>,
    stop: &AtomicBool,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<RunSummary> {
    let sets = database::list_sets(conn)?;

    let mut checkpoint = store.load()?.unwrap_or_default();
    if checkpoint.set_index > 0 {
        log::info!(
            "Resuming from checkpoint: {}/{} sets done, {} cards added so far",
            checkpoint.set_index,
            checkpoint.total_sets,
            checkpoint.cards_added
        );
    }
    checkpoint.total_sets = sets.len();

    let mut summary = RunSummary {
        sets_processed: 0,
        cards_added: 0,
        stopped: false,
    };

    for (index, set) in sets.iter().enumerate().skip(checkpoint.set_index) {
        if stop.load(Ordering::SeqCst) {
            log::info!("Stop requested, ending run at set boundary");
            summary.stopped = true;
            break;
        }
        if let Some(limit) = limit {
            if summary.sets_processed >= limit {
                log::info!("Reached per-run limit of {} sets", limit);
                break;
            }
        }

        on_progress(ProgressEvent {
            set_index: index,
            total_sets: sets.len(),
            current_set_name: set.name.clone(),
            cards_added_so_far: checkpoint.cards_added,
        });

        let outcome = process_set(conn, client, match_config, set, &mut checkpoint).await?;

        if let SetOutcome::Done { cards_added } = outcome {
            checkpoint.cards_added += cards_added;
            summary.cards_added += cards_added;
        }

        // Resumability boundary: the cursor only advances together with a
        // successful save, so a crash here re-runs this set at most once
        checkpoint.set_index = index + 1;
        checkpoint.sets_processed += 1;
        checkpoint.touch();
        store.save(&checkpoint)?;
        summary.sets_processed += 1;
    }

    log::info!(
        "Run finished: {} sets processed, {} cards added, {} errors recorded",
        summary.sets_processed,
        summary.cards_added,
        checkpoint.errors.len()
    );
    Ok(summary)
}

/// One set through the Fetching -> Matching -> Inserting pipeline
async fn process_set(
    conn: &Connection,
    client: &CatalogClient,
    match_config: &MatchConfig,
    set: &CardSet,
    checkpoint: &mut ImportCheckpoint,
) -> Result<SetOutcome> {
    log::info!("[{}] fetching products", set.name);
    let products = match client.search(&set.name).await {
        SearchOutcome::Products(products) => products,
        SearchOutcome::FetchFailed {
            query,
            attempts,
            reason,
        } => {
            checkpoint.record_error(
                ErrorKind::FetchFailed,
                &set.name,
                format!("query '{}' failed after {} attempts: {}", query, attempts, reason),
            );
            return Ok(SetOutcome::Failed);
        }
    };

    log::info!("[{}] matching {} products", set.name, products.len());
    let accepted = filter_matching(&set.name, &products, match_config);
    if accepted.is_empty() {
        log::info!("[{}] no matching products, nothing to insert", set.name);
        return Ok(SetOutcome::Done { cards_added: 0 });
    }

    log::info!("[{}] inserting from {} accepted products", set.name, accepted.len());
    let existing = database::list_cards(conn, set.id)?;
    let mut dedup = DedupIndex::from_cards(&existing);
    let mut cards_added: u64 = 0;

    for product in accepted {
        let parsed = parse_label(&product.product_name, &set.name);
        if parsed.is_fallback() {
            checkpoint.record_error(
                ErrorKind::ParseAmbiguous,
                &set.name,
                format!("no catalog number in label '{}'", product.product_name),
            );
        }

        if parsed.name().is_empty() {
            continue;
        }
        if dedup.contains(parsed.name(), parsed.number()) {
            log::debug!(
                "[{}] skipping existing card '{}' #{}",
                set.name,
                parsed.name(),
                parsed.number()
            );
            continue;
        }

        let card = card_from_product(set.id, parsed.name(), parsed.number(), product);
        match database::insert_card(conn, &card) {
            Ok(stored) => {
                dedup.insert(&stored.name, &stored.card_number);
                cards_added += 1;
            }
            Err(e) => {
                // A single rejected card never aborts the set
                checkpoint.record_error(
                    ErrorKind::InsertFailed,
                    &set.name,
                    format!("'{}' #{}: {}", card.name, card.card_number, e),
                );
            }
        }
    }

    if cards_added > 0 {
        let total = database::card_count(conn, set.id)?;
        database::update_set_total(conn, set.id, total)?;
        log::info!(
            "[{}] added {} cards, set now reports {} cards",
            set.name,
            cards_added,
            total
        );
    }

    Ok(SetOutcome::Done { cards_added })
}

fn card_from_product(set_id: i64, name: &str, number: &str, product: &SearchProduct) -> Card {
    let mut card = Card::new(set_id, name, number);
    card.front_image_url = product.image.clone();
    card.estimated_value = product.estimated_value();
    card
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
