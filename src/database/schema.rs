pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS artworks (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        filepath TEXT UNIQUE NOT NULL,
        artist TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '',
        timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS tags (
        name TEXT PRIMARY KEY NOT NULL
    );
";

pub const DROP_ALL: &str = "
    DROP TABLE IF EXISTS artworks;
    DROP TABLE IF EXISTS tags;
";
