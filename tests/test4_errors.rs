mod common;

use std::sync::LazyLock;

use common::{Album, service, setup_albums, unique_db_path};
use sql_rowmap::prelude::*;
use sql_rowmap::{DeclaredType, FieldDef, FieldMut, FieldShape, Schema};

sql_rowmap::record! {
    #[derive(Debug, Default)]
    struct Tagged {
        id: i64 as "ID",
        tags: Vec<String> as "Title",
    }
}

#[tokio::test]
async fn unsupported_field_type_reports_no_conversion() -> Result<(), SqlRowMapError> {
    let service = service("no_conversion").await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    let err = service
        .query::<Tagged>(&cancel, "SELECT ID, Title FROM Albums", &[])
        .await
        .unwrap_err();
    match err {
        SqlRowMapError::NoConversion { column, type_name } => {
            assert_eq!(column, "Title");
            assert!(type_name.contains("Vec"), "{type_name}");
        }
        other => panic!("expected NoConversion, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn no_conversion_is_reported_before_any_row_is_read() -> Result<(), SqlRowMapError> {
    let service = service("no_conversion_empty").await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    let err = service
        .query::<Tagged>(&cancel, "SELECT ID, Title FROM Albums WHERE ID < 0", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRowMapError::NoConversion { .. }), "{err:?}");

    let err = service
        .one::<Tagged>(&cancel, "SELECT ID, Title FROM Albums WHERE ID < 0", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRowMapError::NoConversion { .. }), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn unmapped_columns_error_by_default() -> Result<(), SqlRowMapError> {
    let service = service("unmapped_default").await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    let err = service
        .query::<Album>(&cancel, "SELECT ID, Title, Artist, 1 AS Extra FROM Albums", &[])
        .await
        .unwrap_err();
    match err {
        SqlRowMapError::UnmappedColumn { column, type_name } => {
            assert_eq!(column, "Extra");
            assert!(type_name.ends_with("Album"), "{type_name}");
        }
        other => panic!("expected UnmappedColumn, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unmapped_columns_can_be_ignored() -> Result<(), SqlRowMapError> {
    common::init_tracing();
    let service = SqliteOptions::builder(unique_db_path("unmapped_ignore"))
        .unmapped_columns(UnmappedColumns::Ignore)
        .build()
        .await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    let albums: Vec<Album> = service
        .query(
            &cancel,
            r#"SELECT ID, 'x' AS "Nope.Title", Title, Artist, 1 AS Extra FROM Albums ORDER BY ID"#,
            &[],
        )
        .await?;
    assert_eq!(albums.len(), 4);
    assert_eq!(albums[3].title, "Violator");
    assert_eq!(albums[3].artist, "Depeche Mode");
    Ok(())
}

#[tokio::test]
async fn driver_errors_pass_through_unchanged() -> Result<(), SqlRowMapError> {
    let service = service("driver_errors").await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    let err = service
        .query::<Album>(&cancel, "SELECT ID, Title, Artist FROM NoSuchTable", &[])
        .await
        .unwrap_err();
    match err {
        SqlRowMapError::SqliteError(e) => {
            assert!(e.to_string().contains("no such table"), "{e}");
        }
        other => panic!("expected SqliteError, got {other:?}"),
    }

    let err = service
        .exec(
            &cancel,
            "INSERT INTO Albums (ID, Title, Artist) VALUES (?1, ?2, ?3)",
            &[RowValues::Int(1), "Dup".into(), "Dup".into()],
        )
        .await
        .unwrap_err();
    match err {
        SqlRowMapError::SqliteError(rusqlite::Error::SqliteFailure(code, _)) => {
            assert_eq!(code.code, rusqlite::ErrorCode::ConstraintViolation);
        }
        other => panic!("expected constraint failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn type_mismatch_from_the_driver_is_surfaced() -> Result<(), SqlRowMapError> {
    let service = service("type_mismatch").await?;
    setup_albums(&service).await?;
    let cancel = CancellationToken::new();

    // Title is text; decoding it into the integer ID field fails in the driver.
    let err = service
        .one::<Album>(&cancel, r#"SELECT Title AS "ID" FROM Albums"#, &[])
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            SqlRowMapError::SqliteError(rusqlite::Error::InvalidColumnType(..))
        ),
        "{err:?}"
    );
    Ok(())
}

/// A destination written without the macro.
#[derive(Debug, Default)]
struct Pair {
    left: String,
    right: Option<i64>,
}

static PAIR_SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema {
    type_name: "Pair",
    fields: vec![
        FieldDef {
            name: "Left",
            shape: FieldShape::Leaf(DeclaredType::of::<String>()),
        },
        FieldDef {
            name: "Right",
            shape: FieldShape::Leaf(DeclaredType::of::<Option<i64>>()),
        },
    ],
});

impl Fields for Pair {
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
        match index {
            0 => Some(FieldMut::leaf(&mut self.left)),
            1 => Some(FieldMut::leaf(&mut self.right)),
            _ => None,
        }
    }
}

impl Record for Pair {
    fn schema() -> &'static Schema {
        &PAIR_SCHEMA
    }
}

#[tokio::test]
async fn hand_written_records_are_materialized() -> Result<(), SqlRowMapError> {
    let service = service("manual_record").await?;
    let cancel = CancellationToken::new();

    let pairs: Vec<Pair> = service
        .query(
            &cancel,
            r#"SELECT 'a' AS "Left", 1 AS "Right" UNION ALL SELECT 'b', NULL ORDER BY 1"#,
            &[],
        )
        .await?;
    assert_eq!(pairs.len(), 2);
    assert_eq!((pairs[0].left.as_str(), pairs[0].right), ("a", Some(1)));
    assert_eq!((pairs[1].left.as_str(), pairs[1].right), ("b", None));

    let err = service
        .one::<Pair>(&cancel, r#"SELECT 'a' AS "left""#, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlRowMapError::UnmappedColumn { .. }), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let err = SqliteOptions::builder(String::new()).build().await.unwrap_err();
    assert!(matches!(err, SqlRowMapError::ConfigError(_)), "{err:?}");

    let err = SqliteOptions::from_json(r#"{"db_path": "x.db", "max_connections": 0}"#).unwrap_err();
    assert!(matches!(err, SqlRowMapError::ConfigError(_)), "{err:?}");

    let err = SqliteOptions::from_json(r#"{"db_path": "x.db", "unmapped_columns": "sometimes"}"#)
        .unwrap_err();
    assert!(matches!(err, SqlRowMapError::ConfigError(_)), "{err:?}");
}
