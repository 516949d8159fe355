pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_DATABASE_PATH: &str = "users.sqlite3";
pub const DEFAULT_TABLE_NAME: &str = "users";
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_VERBOSITY: &str = "normal";

pub const NAME_COLUMN: &str = "name";
pub const SURNAME_COLUMN: &str = "surname";
pub const EMAIL_COLUMN: &str = "email";

// Given name, family name and email occupy the first three mapping slots
pub const EMAIL_SLOT: usize = 2;
pub const MIN_MAPPED_COLUMNS: usize = 3;

pub const MAX_IDENTIFIER_LENGTH: usize = 63;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_EMAIL_LOCAL_PART_LENGTH: usize = 64;
pub const MAX_DOMAIN_LABEL_LENGTH: usize = 63;

pub const FORBIDDEN_EMAIL_CHARS: &[char] = &['!', '\''];

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
