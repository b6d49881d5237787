#![allow(dead_code)]

use sql_rowmap::prelude::*;
use tempfile::tempdir;

pub fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn service(prefix: &str) -> Result<QueryService, SqlRowMapError> {
    init_tracing();
    SqliteOptions::builder(unique_db_path(prefix)).build().await
}

sql_rowmap::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Album {
        pub id: i64 as "ID",
        pub title: String as "Title",
        pub artist: String as "Artist",
    }
}

pub async fn setup_albums(service: &QueryService) -> Result<(), SqlRowMapError> {
    service
        .exec(
            &CancellationToken::new(),
            "
DROP TABLE IF EXISTS Albums;
CREATE TABLE Albums (
  ID INTEGER PRIMARY KEY AUTOINCREMENT,
  Title VARCHAR(128) NOT NULL,
  Artist VARCHAR(255) NOT NULL
);

INSERT INTO Albums
  (Title, Artist)
VALUES
  ('Eliminator', 'ZZ Top'),
  ('Sports', 'Huey Lewis and The News'),
  ('Songs from the Big Chair', 'Tears For Fears'),
  ('Violator', 'Depeche Mode');",
            &[],
        )
        .await?;
    Ok(())
}
