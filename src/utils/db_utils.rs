use actix_web::error::ErrorBadRequest;
use serde_json::Value;
use sqlx::MySqlPool;


/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Bool(bool),
}


/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}


/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed_columns` may appear in the payload; column
/// names are never taken from the request verbatim.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed_columns: &[&'static str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = allowed_columns
            .iter()
            .find(|c| **c == key.as_str())
            .ok_or_else(|| ErrorBadRequest(format!("Field '{key}' cannot be updated")))?;

        // Convert JSON values → SqlValue
        let value = match value {
            Value::String(s) => SqlValue::String(s.clone()),
            Value::Number(n) => match n.as_u64() {
                Some(u) => SqlValue::U64(u),
                None => SqlValue::F64(
                    n.as_f64()
                        .ok_or_else(|| ErrorBadRequest(format!("Field '{key}' is not a number")))?,
                ),
            },
            Value::Bool(b) => SqlValue::Bool(*b),
            _ => {
                return Err(ErrorBadRequest(format!(
                    "Unsupported value for field '{key}'"
                )));
            }
        };

        columns.push(*column);
        values.push(value);
    }

    // Build SET clause
    let set_clause = columns
        .iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}


/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    pool: &MySqlPool,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
