//! Database operations for the card catalog
//!
//! Uses parameterized queries exclusively for security (no SQL string
//! concatenation). The engine owns two tables: `card_sets` (read, count
//! adjustments only) and `cards` (insert-only; cards are never auto-deleted).

use rusqlite::{params, Connection, OptionalExtension};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// One collectible set or subset, created by administrators
#[derive(Debug, Clone)]
pub struct CardSet {
    pub id: i64,
    pub name: String,
    pub year: Option<i64>,
    pub total_cards: i64,
}

/// One card, owned by exactly one set
#[derive(Debug, Clone)]
pub struct Card {
    /// Row id; 0 until the card has been inserted
    pub id: i64,
    pub set_id: i64,
    pub card_number: String,
    pub name: String,
    pub variation: Option<String>,
    pub rarity: Option<String>,
    pub front_image_url: Option<String>,
    pub estimated_value: Option<f64>,
    pub description: Option<String>,
}

impl Card {
    /// A card with just the identity fields filled in
    pub fn new(set_id: i64, name: &str, card_number: &str) -> Self {
        Self {
            id: 0,
            set_id,
            card_number: card_number.to_string(),
            name: name.to_string(),
            variation: None,
            rarity: None,
            front_image_url: None,
            estimated_value: None,
            description: None,
        }
    }
}

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `card_sets`: sets/subsets the reconciliation runs against
/// - `cards`: individual cards, inserted by this engine or manual entry
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS card_sets (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            year INTEGER,
            total_cards INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL,
            card_number TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            variation TEXT,
            rarity TEXT,
            front_image_url TEXT,
            estimated_value REAL,
            description TEXT,
            added_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (set_id) REFERENCES card_sets(id)
        );

        CREATE INDEX IF NOT EXISTS idx_cards_set ON cards(set_id);
        -- Last line of defense against double inserts; the dedup index
        -- normally catches duplicates before they reach the database
        CREATE UNIQUE INDEX IF NOT EXISTS idx_cards_natural_key
            ON cards(set_id, card_number, name);
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Insert a set (administrative seeding; the engine itself only reads sets)
pub fn insert_set(conn: &Connection, set: &CardSet) -> DbResult<()> {
    conn.execute(
        "INSERT INTO card_sets (id, name, year, total_cards) VALUES (?1, ?2, ?3, ?4)",
        params![set.id, &set.name, set.year, set.total_cards],
    )?;
    Ok(())
}

/// All sets, ascending by id - the reconciliation backlog order
pub fn list_sets(conn: &Connection) -> DbResult<Vec<CardSet>> {
    let mut stmt =
        conn.prepare("SELECT id, name, year, total_cards FROM card_sets ORDER BY id ASC")?;
    let sets: DbResult<Vec<CardSet>> = stmt
        .query_map([], |row| {
            Ok(CardSet {
                id: row.get(0)?,
                name: row.get(1)?,
                year: row.get(2)?,
                total_cards: row.get(3)?,
            })
        })?
        .collect();
    sets
}

pub fn get_set(conn: &Connection, set_id: i64) -> DbResult<Option<CardSet>> {
    conn.query_row(
        "SELECT id, name, year, total_cards FROM card_sets WHERE id = ?1",
        params![set_id],
        |row| {
            Ok(CardSet {
                id: row.get(0)?,
                name: row.get(1)?,
                year: row.get(2)?,
                total_cards: row.get(3)?,
            })
        },
    )
    .optional()
}

/// All cards stored for one set
pub fn list_cards(conn: &Connection, set_id: i64) -> DbResult<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, set_id, card_number, name, variation, rarity,
                front_image_url, estimated_value, description
         FROM cards WHERE set_id = ?1 ORDER BY id ASC",
    )?;
    let cards: DbResult<Vec<Card>> = stmt
        .query_map(params![set_id], |row| {
            Ok(Card {
                id: row.get(0)?,
                set_id: row.get(1)?,
                card_number: row.get(2)?,
                name: row.get(3)?,
                variation: row.get(4)?,
                rarity: row.get(5)?,
                front_image_url: row.get(6)?,
                estimated_value: row.get(7)?,
                description: row.get(8)?,
            })
        })?
        .collect();
    cards
}

/// Insert one card and return it with its assigned row id.
///
/// Fails with a constraint error if the (set, number, name) key already
/// exists; callers record that as a per-card failure and continue.
pub fn insert_card(conn: &Connection, card: &Card) -> DbResult<Card> {
    conn.execute(
        "INSERT INTO cards
         (set_id, card_number, name, variation, rarity, front_image_url,
          estimated_value, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            card.set_id,
            &card.card_number,
            &card.name,
            &card.variation,
            &card.rarity,
            &card.front_image_url,
            card.estimated_value,
            &card.description,
        ],
    )?;

    let mut stored = card.clone();
    stored.id = conn.last_insert_rowid();
    Ok(stored)
}

/// Number of cards stored for a set
pub fn card_count(conn: &Connection, set_id: i64) -> DbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE set_id = ?1",
        params![set_id],
        |row| row.get(0),
    )
}

/// Refresh a set's reported card count after an import pass
pub fn update_set_total(conn: &Connection, set_id: i64, total_cards: i64) -> DbResult<()> {
    conn.execute(
        "UPDATE card_sets SET total_cards = ?1 WHERE id = ?2",
        params![total_cards, set_id],
    )?;
    Ok(())
}
