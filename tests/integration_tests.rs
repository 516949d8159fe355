use anyhow::Result;
use rusqlite::params;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use user_upload::config::Config;
use user_upload::{ColumnMapping, Identifier, ImportError, ImportOptions, Importer, SqliteStore};

const USERS_CSV: &str = "name,surname,email
John,smith,jsmith@gmail.com
HAMISH,JONES,ham@seek.com
Phil,CARRY   ,phil@open.edu.au
Johnny,O'Hare,john@yahoo.com.au
Mike,O'Connor,MIKE@UQ.EDU.AU
William,Smythe,happy@ent.com.au
Hamish,Jones,ham@seek.com
Sam!!,Walters,sam!@walters.org
Daley,Thompson,daley@yahoo.co.nz
Kevin,Ruley,kevin.ruley@gmail.com
Edward,JIKES,edward@jikes@com.au
";

/// Helper function to create a temporary database with an empty users table
fn create_test_database(temp_dir: &TempDir) -> Result<PathBuf> {
    let db_path = temp_dir.path().join("users.sqlite3");
    let store = SqliteStore::open(&db_path)?;
    store.create_users_table(&users_table())?;
    Ok(db_path)
}

fn create_test_csv(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

fn users_table() -> Identifier {
    Identifier::parse("users").unwrap()
}

fn users_mapping() -> ColumnMapping {
    ColumnMapping::new([("name", "name"), ("surname", "surname"), ("email", "email")]).unwrap()
}

fn import_file(db_path: &Path, csv_path: &Path) -> Result<user_upload::RunStatistics, ImportError> {
    let store = SqliteStore::open(db_path).unwrap();
    let mut importer = Importer::new(store, users_table());
    importer.import(csv_path, b',', &users_mapping())
}

fn stored_users(db_path: &Path) -> Result<Vec<(String, String, String)>> {
    let store = SqliteStore::open(db_path)?;
    let mut stmt = store
        .connection()
        .prepare("SELECT name, surname, email FROM users ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[test]
fn test_end_to_end_import() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = create_test_csv(temp_dir.path(), "users.csv", USERS_CSV)?;

    let stats = import_file(&db_path, &csv_path)?;

    assert_eq!(stats.total_rows, 11);
    assert_eq!(stats.successful_inserts, 8);
    assert_eq!(stats.failed_inserts, 3);
    assert!(stats.is_balanced());

    assert_eq!(
        stats.errors,
        vec![
            "Row 7: email 'ham@seek.com' already exists".to_string(),
            "Row 8: invalid email address 'sam!@walters.org': contains forbidden character '!'".to_string(),
            "Row 11: invalid email address 'edward@jikes@com.au'".to_string(),
        ]
    );

    let users = stored_users(&db_path)?;
    assert_eq!(users.len(), 8);
    assert_eq!(
        users[0],
        ("John".to_string(), "Smith".to_string(), "jsmith@gmail.com".to_string())
    );
    assert_eq!(users[1].0, "Hamish");
    assert_eq!(users[1].1, "Jones");
    assert_eq!(users[2].1, "Carry");
    assert_eq!(users[3].1, "O'Hare");
    assert_eq!(users[4].1, "O'Connor");
    // Emails are stored as supplied, not case-folded
    assert_eq!(users[4].2, "MIKE@UQ.EDU.AU");

    Ok(())
}

#[test]
fn test_existing_rows_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    {
        let store = SqliteStore::open(&db_path)?;
        store.connection().execute(
            "INSERT INTO users (name, surname, email) VALUES (?1, ?2, ?3)",
            params!["Jane", "Doe", "jane@example.com"],
        )?;
    }
    let csv_path = create_test_csv(
        temp_dir.path(),
        "users.csv",
        "name,surname,email\njane,doe,jane@example.com\njohn,doe,john@example.com\n",
    )?;

    let stats = import_file(&db_path, &csv_path)?;

    assert_eq!(stats.successful_inserts, 1);
    assert_eq!(stats.failed_inserts, 1);
    assert_eq!(stored_users(&db_path)?.len(), 2);

    Ok(())
}

#[test]
fn test_second_run_is_all_duplicates() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = create_test_csv(
        temp_dir.path(),
        "users.csv",
        "name,surname,email\njane,doe,jane@example.com\njohn,doe,john@example.com\nmary,major,mary@example.com\n",
    )?;

    let first = import_file(&db_path, &csv_path)?;
    assert_eq!(first.successful_inserts, 3);

    let second = import_file(&db_path, &csv_path)?;
    assert_eq!(second.successful_inserts, 0);
    assert_eq!(second.failed_inserts, second.total_rows);
    assert_eq!(stored_users(&db_path)?.len(), 3);

    Ok(())
}

#[test]
fn test_missing_column_commits_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = create_test_csv(
        temp_dir.path(),
        "users.csv",
        "name,last_name,email\njane,doe,jane@example.com\njohn,doe,john@example.com\n",
    )?;

    let err = import_file(&db_path, &csv_path).unwrap_err();
    assert!(matches!(err, ImportError::ColumnMappingInvalid(_)));
    assert!(err.to_string().contains("surname"));
    assert!(stored_users(&db_path)?.is_empty());

    Ok(())
}

#[test]
fn test_unreadable_row_commits_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = temp_dir.path().join("users.csv");
    let mut content = b"name,surname,email\njane,doe,jane@example.com\n".to_vec();
    content.extend_from_slice(b"\xc3\x28,doe,john@example.com\n");
    fs::write(&csv_path, content)?;

    let err = import_file(&db_path, &csv_path).unwrap_err();
    assert!(matches!(err, ImportError::RowUnreadable { row: 2, .. }));
    assert!(stored_users(&db_path)?.is_empty());

    Ok(())
}

#[test]
fn test_missing_table_rejects_rows_without_aborting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("empty.sqlite3");
    let csv_path = create_test_csv(
        temp_dir.path(),
        "users.csv",
        "name,surname,email\njane,doe,jane@example.com\n",
    )?;

    let stats = import_file(&db_path, &csv_path)?;
    assert_eq!(stats.failed_inserts, 1);
    assert!(stats.errors[0].starts_with("Row 1: duplicate check failed"));

    Ok(())
}

#[test]
fn test_dry_run_leaves_table_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = create_test_csv(temp_dir.path(), "users.csv", USERS_CSV)?;

    let store = SqliteStore::open(&db_path)?;
    let mut importer = Importer::new(store, users_table()).with_options(ImportOptions {
        dry_run: true,
        ..ImportOptions::default()
    });
    let stats = importer.import(&csv_path, b',', &users_mapping())?;

    assert_eq!(stats.successful_inserts, 8);
    assert_eq!(importer.store().row_count(&users_table())?, 0);

    Ok(())
}

#[test]
fn test_extra_mapped_column() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("contacts.sqlite3");
    let table = Identifier::parse("contacts")?;
    {
        let store = SqliteStore::open(&db_path)?;
        store.connection().execute_batch(
            "CREATE TABLE contacts (
                given TEXT NOT NULL,
                family TEXT NOT NULL,
                mail TEXT NOT NULL UNIQUE,
                city TEXT
            )",
        )?;
    }
    let csv_path = create_test_csv(
        temp_dir.path(),
        "contacts.csv",
        "E-mail|City|First|Last\nann@example.com| Perth |ANN|lee\nbo@example.com\n",
    )?;
    let mapping = ColumnMapping::new([
        ("First", "given"),
        ("Last", "family"),
        ("E-mail", "mail"),
        ("City", "city"),
    ])?;

    let store = SqliteStore::open(&db_path)?;
    let mut importer = Importer::new(store, table);
    let stats = importer.import(&csv_path, b'|', &mapping)?;
    assert_eq!(stats.successful_inserts, 2);

    let store = importer.into_store();
    let mut stmt = store
        .connection()
        .prepare("SELECT given, family, mail, city FROM contacts ORDER BY mail")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    assert_eq!(
        rows[0],
        (
            "Ann".to_string(),
            "Lee".to_string(),
            "ann@example.com".to_string(),
            Some("Perth".to_string())
        )
    );
    assert_eq!(
        rows[1],
        (String::new(), String::new(), "bo@example.com".to_string(), None)
    );

    Ok(())
}

#[tokio::test]
async fn test_import_driven_by_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = create_test_database(&temp_dir)?;
    let csv_path = create_test_csv(
        temp_dir.path(),
        "users.csv",
        "name;surname;email\njane;doe;jane@example.com\n",
    )?;

    let config_content = format!(
        r#"{{
        "database": {{ "path": "{}" }},
        "import": {{
            "table": "users",
            "delimiter": ";",
            "columns": [
                {{ "source": "name", "target": "name" }},
                {{ "source": "surname", "target": "surname" }},
                {{ "source": "email", "target": "email" }}
            ],
            "on_lookup_error": "abort"
        }},
        "logging": {{ "verbosity": "normal" }}
    }}"#,
        db_path.display()
    );
    let config_path = create_test_csv(temp_dir.path(), "config.json", &config_content)?;

    let config = Config::load(&config_path).await?;
    let store = SqliteStore::open(&config.database.path)?;
    let mut importer = Importer::new(store, config.import.table_identifier()?)
        .with_options(config.import.options(false));
    let stats = importer.import(
        &csv_path,
        config.import.delimiter_byte()?,
        &config.import.column_mapping()?,
    )?;

    assert_eq!(stats.successful_inserts, 1);
    assert_eq!(stored_users(&db_path)?.len(), 1);

    Ok(())
}
