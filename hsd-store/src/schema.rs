//! SQL schema contract, §6: the daemon specifies only the shape of
//! these tables; the driver underneath is an external collaborator
//! (§1). `CREATE TABLE IF NOT EXISTS` keeps startup idempotent across
//! restarts, matching `node/db`'s treatment of database opening as a
//! cheap, repeatable operation.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hdb_hosts (
    id                      INTEGER NOT NULL,
    network                 TEXT    NOT NULL,
    public_key              TEXT    NOT NULL,
    net_address             TEXT    NOT NULL,
    protocol                TEXT    NOT NULL,
    first_seen_height       INTEGER NOT NULL,
    known_since_height      INTEGER NOT NULL,
    last_announcement       TEXT    NOT NULL,
    uptime_ns               INTEGER NOT NULL,
    downtime_ns             INTEGER NOT NULL,
    successes               REAL    NOT NULL,
    failures                REAL    NOT NULL,
    consecutive_scan_failures        INTEGER NOT NULL,
    consecutive_benchmark_failures   INTEGER NOT NULL,
    last_benchmark_at       TEXT,
    state                   TEXT    NOT NULL,
    blocked                 INTEGER NOT NULL,
    score_total             REAL    NOT NULL,
    record_json             TEXT    NOT NULL,
    modified                INTEGER NOT NULL,
    seq                     INTEGER NOT NULL,
    PRIMARY KEY (id, network)
);
CREATE UNIQUE INDEX IF NOT EXISTS hdb_hosts_network_pubkey ON hdb_hosts (network, public_key);
CREATE INDEX IF NOT EXISTS hdb_hosts_modified ON hdb_hosts (modified);

CREATE TABLE IF NOT EXISTS hdb_scans (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    network         TEXT    NOT NULL,
    public_key      TEXT    NOT NULL,
    ran_at          TEXT    NOT NULL,
    success         INTEGER NOT NULL,
    latency_ns      INTEGER NOT NULL,
    error           TEXT,
    settings_blob   BLOB,
    price_table_blob BLOB,
    FOREIGN KEY (network, public_key) REFERENCES hdb_hosts (network, public_key)
);
CREATE INDEX IF NOT EXISTS hdb_scans_host ON hdb_scans (network, public_key, ran_at);

CREATE TABLE IF NOT EXISTS hdb_benchmarks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    network         TEXT    NOT NULL,
    public_key      TEXT    NOT NULL,
    ran_at          TEXT    NOT NULL,
    success         INTEGER NOT NULL,
    upload_bps      REAL    NOT NULL,
    download_bps    REAL    NOT NULL,
    ttfb_ns         INTEGER NOT NULL,
    error           TEXT,
    FOREIGN KEY (network, public_key) REFERENCES hdb_hosts (network, public_key)
);
CREATE INDEX IF NOT EXISTS hdb_benchmarks_host ON hdb_benchmarks (network, public_key, ran_at);

CREATE TABLE IF NOT EXISTS hdb_tip (
    network     TEXT PRIMARY KEY,
    height      INTEGER NOT NULL,
    block_id    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hdb_domains (
    suffix      TEXT PRIMARY KEY
);
"#;
