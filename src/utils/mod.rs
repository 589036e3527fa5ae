pub mod bins;
pub mod process;

pub mod time {
    use std::time::SystemTime;

    use anyhow::Result;
    use time::{Date, OffsetDateTime, UtcOffset, macros::format_description};

    fn local_offset() -> UtcOffset {
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
    }

    pub fn today() -> Date {
        OffsetDateTime::now_utc().to_offset(local_offset()).date()
    }

    pub fn dump_stamp(date: Date) -> Result<String> {
        Ok(date.format(format_description!(
            "[month repr:short]-[day]-[year]"
        ))?)
    }

    pub fn fmt_created(ts: SystemTime) -> Result<String> {
        let dt = OffsetDateTime::from(ts).to_offset(local_offset());
        Ok(dt.format(format_description!(
            "[month]/[day]/[year], [hour]:[minute]:[second]"
        ))?)
    }

}

pub mod naming {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use regex::Regex;
    use time::Date;

    use crate::{error::AppError, utils::time::dump_stamp};

    pub const DUMP_EXT: &str = "sql";

    const DUMP_NAME_PATTERN: &str = r"^[A-Za-z0-9._-]+$";

    pub fn validate_dump_name(name: &str) -> Result<()> {
        let re = Regex::new(DUMP_NAME_PATTERN)
            .with_context(|| format!("bad dump name pattern {DUMP_NAME_PATTERN}"))?;
        if re.is_match(name) && name != "." && name != ".." {
            Ok(())
        } else {
            Err(AppError::Validation(
                "use letters, digits, '.', '_' or '-' for the dump name".into(),
            )
            .into())
        }
    }

    pub fn dump_suffix(date: Date) -> Result<String> {
        Ok(format!("_{}.{DUMP_EXT}", dump_stamp(date)?))
    }

    pub fn dump_path(folder: &Path, name: &str, date: Date) -> Result<PathBuf> {
        validate_dump_name(name)?;
        Ok(folder.join(format!("{name}{}", dump_suffix(date)?)))
    }

    pub fn is_dump(file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == DUMP_EXT)
    }

}
