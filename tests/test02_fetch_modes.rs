#![cfg(feature = "sqlite")]

use serde::Deserialize;
use simple_db_layer::prelude::*;

fn scores_db() -> Result<Connection, DbError> {
    let db = Connection::open("sqlite::memory:");
    db.execute_batch(
        "CREATE TABLE scores (team TEXT, player TEXT, points INTEGER);
         INSERT INTO scores (team, player, points) VALUES
             ('red', 'ann', 3),
             ('blue', 'bob', 5),
             ('red', 'cid', 7);",
    )?;
    Ok(db)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn key_value_pairs() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT player, points FROM scores ORDER BY rowid", ())?;
    stmt.set_fetch_mode(FetchMode::KeyValuePair);
    let pairs = stmt.fetch_all()?.into_pairs().expect("pairs");
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs.get(&MapKey::from("bob")), Some(&Value::Int(5)));
    Ok(())
}

#[test]
fn key_value_pairs_need_exactly_two_columns() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player, points FROM scores", ())?;
    stmt.set_fetch_mode(FetchMode::KeyValuePair);
    assert!(matches!(stmt.fetch_all(), Err(DbError::FetchModeError(_))));
    Ok(())
}

#[test]
fn duplicate_keys_keep_last_value_in_first_position() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player FROM scores ORDER BY rowid", ())?;
    stmt.set_fetch_mode(FetchMode::KeyValuePair);
    let pairs = stmt.fetch_all()?.into_pairs().expect("pairs");
    let entries: Vec<_> = pairs.into_iter().collect();
    assert_eq!(
        entries,
        vec![(MapKey::from("red"), text("cid")), (MapKey::from("blue"), text("bob"))]
    );
    Ok(())
}

#[test]
fn key_row_pairs_drop_the_key_column() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT player, team, points FROM scores ORDER BY rowid", ())?;
    stmt.set_fetch_mode(FetchMode::KeyRowPair);

    let Some(Fetched::KeyRow(key, rest)) = stmt.fetch()? else {
        panic!("expected a keyed row");
    };
    assert_eq!(key, MapKey::from("ann"));
    assert_eq!(rest.columns(), ["team", "points"]);

    let remaining = stmt.fetch_all()?.into_key_rows().expect("key rows");
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[&MapKey::from("cid")].get("points"), Some(&Value::Int(7)));
    Ok(())
}

#[test]
fn group_rows_by_first_column() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player, points FROM scores ORDER BY rowid", ())?;
    stmt.set_fetch_mode(FetchMode::GroupRow);
    let groups = stmt.fetch_all()?.into_groups().expect("groups");

    let teams: Vec<_> = groups.keys().cloned().collect();
    assert_eq!(teams, vec![MapKey::from("red"), MapKey::from("blue")]);
    let red = &groups[&MapKey::from("red")];
    assert_eq!(red.len(), 2);
    assert_eq!(red[1].get("player"), Some(&text("cid")));
    assert_eq!(red[1].columns(), ["player", "points"]);
    Ok(())
}

#[test]
fn group_second_column_values() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player FROM scores ORDER BY rowid", ())?;
    stmt.set_fetch_mode(FetchMode::GroupColumn);
    let groups = stmt.fetch_all()?.into_group_values().expect("group values");
    assert_eq!(groups[&MapKey::from("red")], vec![text("ann"), text("cid")]);
    assert_eq!(groups[&MapKey::from("blue")], vec![text("bob")]);
    Ok(())
}

#[test]
fn integer_like_text_keys_become_integers() -> Result<(), DbError> {
    let db = Connection::open("sqlite::memory:");
    let mut stmt = db.prepare("SELECT '10' AS k, 'x' AS v UNION ALL SELECT '007', 'y'", ())?;
    stmt.set_fetch_mode(FetchMode::KeyValuePair);
    let pairs = stmt.fetch_all()?.into_pairs().expect("pairs");
    assert_eq!(pairs.get(&MapKey::Int(10)), Some(&text("x")));
    assert_eq!(pairs.get(&MapKey::from("007")), Some(&text("y")));
    Ok(())
}

#[test]
fn fetch_mode_can_change_between_fetches() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player, points FROM scores ORDER BY rowid", ())?;

    let first = stmt.fetch()?.and_then(Fetched::into_row).expect("row");
    assert_eq!(first.get("player"), Some(&text("ann")));

    stmt.set_fetch_mode(FetchMode::Column(2));
    assert_eq!(stmt.fetch()?, Some(Fetched::Value(Value::Int(5))));
    assert_eq!(stmt.fetch_mode(), FetchMode::Column(2));
    Ok(())
}

#[test]
fn column_past_the_end_is_rejected() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player FROM scores", ())?;
    stmt.set_fetch_mode(FetchMode::Column(5));
    assert!(matches!(stmt.fetch(), Err(DbError::FetchModeError(_))));
    Ok(())
}

#[test]
fn empty_results_exhaust_immediately() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team FROM scores WHERE points > ?", params![100])?;
    assert_eq!(stmt.fetch()?, None);
    assert_eq!(stmt.state(), StatementState::Exhausted);
    assert!(stmt.fetch_all()?.is_empty());

    let mut stmt = db.prepare("SELECT team, player FROM scores WHERE points > ?", params![100])?;
    stmt.set_fetch_mode(FetchMode::GroupColumn);
    assert_eq!(
        stmt.fetch_all()?,
        FetchedAll::GroupValues(indexmap::IndexMap::new())
    );
    Ok(())
}

#[derive(Debug, Deserialize, PartialEq)]
struct Score {
    team: String,
    player: String,
    points: i64,
}

#[test]
fn rows_map_onto_structs() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT team, player, points FROM scores ORDER BY rowid", ())?;
    let first: Option<Score> = stmt.fetch_into()?;
    assert_eq!(
        first,
        Some(Score {
            team: "red".into(),
            player: "ann".into(),
            points: 3,
        })
    );
    let rest: Vec<Score> = stmt.fetch_all_into()?;
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1].points, 7);

    let mut stmt = db.prepare("SELECT team, points FROM scores", ())?;
    let err = stmt.fetch_into::<Score>().unwrap_err();
    assert!(matches!(err, DbError::FetchModeError(_)));
    Ok(())
}

#[test]
fn exhausted_statement_can_run_again() -> Result<(), DbError> {
    let db = scores_db()?;
    let mut stmt = db.prepare("SELECT player FROM scores WHERE team = ?", params!["red"])?;
    assert_eq!(stmt.fetch_all()?.len(), 2);
    assert_eq!(stmt.state(), StatementState::Exhausted);

    stmt.execute(params!["blue"])?;
    assert_eq!(stmt.state(), StatementState::Executed);
    assert_eq!(stmt.fetch_field()?, Some(text("bob")));
    Ok(())
}
