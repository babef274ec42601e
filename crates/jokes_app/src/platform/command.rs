use jokes_engine::{Query, QueryError};

use super::app::AppError;

pub const USAGE: &str = "usage: jokes_app search <query...> | jokes_app random [count]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(Query),
    /// `None` uses the configured default count.
    Random(Option<usize>),
}

impl Command {
    pub fn parse<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            Some("search") => {
                let text = args.collect::<Vec<_>>().join(" ");
                let query = Query::new(text)
                    .map_err(|err: QueryError| AppError::Usage(err.to_string()))?;
                Ok(Command::Search(query))
            }
            Some("random") => match args.next() {
                None => Ok(Command::Random(None)),
                Some(raw) => raw
                    .parse()
                    .map(|count| Command::Random(Some(count)))
                    .map_err(|_| AppError::Usage(format!("invalid count {raw:?}"))),
            },
            _ => Err(AppError::Usage(USAGE.to_string())),
        }
    }
}
