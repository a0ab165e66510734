pub const EXIT_OK: i32 = 0;
pub const EXIT_NOT_FOUND: i32 = 1;
pub const EXIT_MISSING_FILE: i32 = 10;
pub const EXIT_INVALID_TABLE: i32 = 11;
pub const EXIT_INVALID_SETTINGS: i32 = 12;
pub const EXIT_TOOL_FAILED: i32 = 13;
pub const EXIT_UNEXPECTED: i32 = 20;
