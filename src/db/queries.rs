pub const CREATE_ALERTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS alerts (
    id        SERIAL PRIMARY KEY,
    message   TEXT NOT NULL,
    latitude  DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    priority  INTEGER NOT NULL
);
"#;

pub const SELECT_ALERT_BY_ID: &str = r#"
SELECT id, message, latitude, longitude, priority FROM alerts WHERE id = $1;
"#;

pub const SELECT_ALERTS_BY_PRIORITY: &str = r#"
SELECT id, message, latitude, longitude, priority FROM alerts ORDER BY priority DESC;
"#;

pub const INSERT_ALERT: &str = r#"
INSERT INTO alerts (message, latitude, longitude, priority)
VALUES ($1, $2, $3, $4)
RETURNING id;
"#;

pub const DELETE_ALERT_BY_ID: &str = r#"
DELETE FROM alerts WHERE id = $1;
"#;

pub const DELETE_ALL_ALERTS: &str = r#"
DELETE FROM alerts;
"#;
