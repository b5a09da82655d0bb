use super::*;
use crate::args;
use std::sync::Arc;

fn cols(pairs: &[(&str, Value)]) -> Columns {
    let names: Arc<[String]> = pairs.iter().map(|(c, _)| c.to_string()).collect();
    Columns {
        names,
        values: pairs.iter().map(|(_, v)| v.clone()).collect(),
    }
}

fn user() -> Columns {
    cols(&[("id", Value::Int(1)), ("name", Value::Text("ann".into()))])
}

#[test]
fn insert_builds_one_placeholder_per_column() {
    let q = insert("users", user()).unwrap();
    assert_eq!(q.sql, "insert into users(id,name) values (?,?)");
    assert_eq!(q.args, vec![Value::Int(1), Value::Text("ann".into())]);
    assert_eq!(q.placeholder_count(), q.args.len());
}

#[test]
fn insert_without_columns_is_rejected() {
    let err = insert("users", cols(&[])).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn insert_rejects_unsafe_table() {
    assert!(insert("users; drop table x", user()).is_err());
}

#[test]
fn update_appends_where_args_after_set_args() {
    let q = update("users", user(), "id = ?", &args![1_i64]).unwrap();
    assert_eq!(q.sql, "update users set id = ?,name = ? where id = ?");
    assert_eq!(
        q.args,
        vec![Value::Int(1), Value::Text("ann".into()), Value::Int(1)]
    );
    assert_eq!(q.placeholder_count(), 3);
}

#[test]
fn update_without_where_targets_all_rows() {
    let q = update("users", user(), "", &[]).unwrap();
    assert_eq!(q.sql, "update users set id = ?,name = ?");
    let q = update("users", user(), "   ", &[]).unwrap();
    assert_eq!(q.sql, "update users set id = ?,name = ?");
}

#[test]
fn upsert_binds_values_twice_in_order() {
    let q = upsert("users", user()).unwrap();
    assert_eq!(
        q.sql,
        "insert into users(id,name) values (?,?) on duplicate key update id = ?,name = ?"
    );
    assert_eq!(q.args.len(), 4);
    assert_eq!(q.args[..2], q.args[2..]);
    assert_eq!(q.placeholder_count(), q.args.len());
}

#[test]
fn select_lists_all_columns() {
    let columns = vec!["id".to_string(), "name".to_string()];
    let q = select("users", &columns, "name like ?", &args!["a%"]).unwrap();
    assert_eq!(q.sql, "select id,name from users where name like ?");
    assert_eq!(q.args, vec![Value::Text("a%".into())]);

    let q = select("users", &columns, "", &[]).unwrap();
    assert_eq!(q.sql, "select id,name from users");
    assert!(q.args.is_empty());
}

#[test]
fn select_requires_columns() {
    assert!(select("users", &[], "", &[]).unwrap_err().is_invalid_argument());
}

#[test]
fn delete_with_and_without_where() {
    let q = delete("users", "id = ?", &args![5_i64]).unwrap();
    assert_eq!(q.sql, "delete from users where id = ?");
    assert_eq!(q.args, vec![Value::Int(5)]);

    let q = delete("users", "", &[]).unwrap();
    assert_eq!(q.sql, "delete from users");
}

#[test]
fn where_text_is_kept_verbatim() {
    let q = delete("users", "id in (?, ?) or name is null", &args![1_i64, 2_i64]).unwrap();
    assert_eq!(q.sql, "delete from users where id in (?, ?) or name is null");
}

#[test]
fn display_includes_args() {
    let q = insert("users", user()).unwrap();
    assert_eq!(
        q.to_string(),
        "insert into users(id,name) values (?,?) [1, \"ann\"]"
    );
}
