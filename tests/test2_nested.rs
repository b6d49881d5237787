mod common;

use common::service;
use sql_rowmap::prelude::*;

sql_rowmap::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct User {
        pub id: i64 as "ID",
        pub name: String as "Name",
    }
}

sql_rowmap::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Message {
        pub id: i64 as "ID",
        #[nested]
        pub user: User as "User",
        pub body: String as "Body",
    }
}

sql_rowmap::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Shadowed {
        pub name: String as "Name",
        #[nested]
        pub user: User as "User",
    }
}

sql_rowmap::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Thread {
        pub id: i64 as "ID",
        #[nested]
        pub last: Message as "Last",
    }
}

async fn setup_messages(service: &QueryService) -> Result<(), SqlRowMapError> {
    service
        .exec(
            &CancellationToken::new(),
            "
DROP TABLE IF EXISTS Messages;
CREATE TABLE Messages (
  ID INTEGER PRIMARY KEY AUTOINCREMENT,
  UserID INTEGER,
  Body VARCHAR(255) NOT NULL
);

DROP TABLE IF EXISTS Users;
CREATE TABLE Users (
  ID INTEGER PRIMARY KEY AUTOINCREMENT,
  Name VARCHAR(128) NOT NULL
);

INSERT INTO Users
  (Name)
VALUES
  ('Stephen Duffy'),
  ('Curt Smith'),
  ('Neil Tennant');

INSERT INTO Messages
  (UserID, Body)
VALUES
  (1, 'Dark in the city night is a wire.'),
  (1, 'Steam in the subway earth is afire.'),
  (2, 'I wanted to be with you alone.'),
  (2, 'And talk about the weather.'),
  (3, 'Sometimes you''re better off dead.'),
  (3, 'There''s a gun in your hand it''s pointing at your head.');",
            &[],
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn dotted_aliases_fill_nested_records() -> Result<(), SqlRowMapError> {
    let service = service("nested_join").await?;
    setup_messages(&service).await?;
    let cancel = CancellationToken::new();

    let messages: Vec<Message> = service
        .query(
            &cancel,
            r#"
SELECT
  m.ID,
  m.Body,
  u.ID AS "User.ID",
  u.Name AS "User.Name"
FROM Messages m
JOIN Users u
ON m.UserID = u.ID
ORDER BY m.ID"#,
            &[],
        )
        .await?;

    assert_eq!(messages.len(), 6);
    assert_eq!(messages[2].user.name, "Curt Smith");
    let authors: Vec<_> = messages.iter().map(|m| (m.id, m.user.id, m.user.name.as_str())).collect();
    assert_eq!(
        authors,
        [
            (1, 1, "Stephen Duffy"),
            (2, 1, "Stephen Duffy"),
            (3, 2, "Curt Smith"),
            (4, 2, "Curt Smith"),
            (5, 3, "Neil Tennant"),
            (6, 3, "Neil Tennant"),
        ]
    );
    assert_eq!(messages[4].body, "Sometimes you're better off dead.");
    Ok(())
}

#[tokio::test]
async fn nested_column_never_writes_same_named_top_level_field() -> Result<(), SqlRowMapError> {
    let service = service("nested_shadow").await?;
    setup_messages(&service).await?;
    let cancel = CancellationToken::new();

    let only_nested: Shadowed = service
        .one(&cancel, r#"SELECT Name AS "User.Name" FROM Users WHERE ID = 2"#, &[])
        .await?;
    assert_eq!(only_nested.user.name, "Curt Smith");
    assert_eq!(only_nested.name, "");

    let both: Shadowed = service
        .one(
            &cancel,
            r#"SELECT 'outer' AS Name, Name AS "User.Name", ID AS "User.ID" FROM Users WHERE ID = 3"#,
            &[],
        )
        .await?;
    assert_eq!(both.name, "outer");
    assert_eq!(both.user, User { id: 3, name: "Neil Tennant".into() });
    Ok(())
}

#[tokio::test]
async fn paths_descend_more_than_one_level() -> Result<(), SqlRowMapError> {
    let service = service("nested_deep").await?;
    setup_messages(&service).await?;
    let cancel = CancellationToken::new();

    let thread: Thread = service
        .one(
            &cancel,
            r#"
SELECT
  100 AS ID,
  m.ID AS "Last.ID",
  m.Body AS "Last.Body",
  u.Name AS "Last.User.Name"
FROM Messages m JOIN Users u ON m.UserID = u.ID
ORDER BY m.ID DESC"#,
            &[],
        )
        .await?;
    assert_eq!(thread.id, 100);
    assert_eq!(thread.last.id, 6);
    assert_eq!(thread.last.user.name, "Neil Tennant");
    assert_eq!(thread.last.user.id, 0);
    Ok(())
}

#[tokio::test]
async fn column_naming_a_nested_record_is_not_addressable() -> Result<(), SqlRowMapError> {
    let service = service("nested_composite").await?;
    setup_messages(&service).await?;
    let cancel = CancellationToken::new();

    let err = service
        .query::<Message>(&cancel, r#"SELECT ID, UserID AS "User" FROM Messages"#, &[])
        .await
        .unwrap_err();
    assert!(
        matches!(err, SqlRowMapError::FieldNotAddressable { ref column } if column == "User"),
        "unexpected error: {err:?}"
    );
    Ok(())
}
