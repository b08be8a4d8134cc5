use actix_web::error::ErrorBadRequest;
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<String>,
    pub id: u64,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// PATCH-style edits for the employee profile. Only columns named in
/// `allowed` may appear in the payload; anything else (unknown columns, or
/// columns the caller keeps immutable, like balance counters) is a 400.
/// Every updatable column is a VARCHAR, so values must be JSON strings.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    if let Some(bad) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ErrorBadRequest(format!(
            "Field '{}' cannot be updated",
            bad
        )));
    }

    let mut values = Vec::with_capacity(obj.len());
    for (key, value) in obj {
        match value {
            Value::String(s) => values.push(s.clone()),
            _ => {
                return Err(ErrorBadRequest(format!(
                    "Field '{}' must be a string",
                    key
                )));
            }
        }
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    Ok(SqlUpdate {
        sql,
        values,
        id: id_value,
    })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = query.bind(value);
    }
    query = query.bind(update.id);

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["first_name", "last_name", "department"];

    #[test]
    fn builds_set_clause_from_allowed_fields() {
        let payload = json!({ "first_name": "Jane" });
        let update = build_update_sql("employees", &payload, ALLOWED, "id", 7).unwrap();

        assert_eq!(update.sql, "UPDATE employees SET first_name = ? WHERE id = ?");
        assert_eq!(update.values, vec!["Jane".to_string()]);
        assert_eq!(update.id, 7);
    }

    #[test]
    fn rejects_fields_outside_the_allow_list() {
        for payload in [
            json!({ "casual_leaves_remaining": 99 }),
            json!({ "date_joined": "2020-01-01" }),
            json!({ "first_name": "Jane", "no_such_column": 1 }),
        ] {
            assert!(build_update_sql("employees", &payload, ALLOWED, "id", 7).is_err());
        }
    }

    #[test]
    fn rejects_non_string_values() {
        for payload in [
            json!({ "first_name": 42 }),
            json!({ "department": null }),
            json!({ "last_name": ["Doe"] }),
        ] {
            assert!(build_update_sql("employees", &payload, ALLOWED, "id", 7).is_err());
        }
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("employees", &json!({}), ALLOWED, "id", 7).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), ALLOWED, "id", 7).is_err());
    }
}
