use crate::Joke;

/// Jokes longer than this many characters render with the small text size.
pub const LONG_JOKE_CHARS: usize = 80;
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeView {
    pub id: String,
    pub text: String,
    pub category: String,
    pub text_size: TextSize,
}

/// Pure joke-to-view transform.
#[derive(Debug, Default, Clone, Copy)]
pub struct JokeViewMapper;

impl JokeViewMapper {
    pub fn to_view(joke: &Joke) -> JokeView {
        let category = joke
            .categories
            .first()
            .map(|category| category.to_uppercase())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let text_size = if joke.text.chars().count() > LONG_JOKE_CHARS {
            TextSize::Small
        } else {
            TextSize::Large
        };
        JokeView {
            id: joke.id.clone(),
            text: joke.text.clone(),
            category,
            text_size,
        }
    }

    pub fn to_views(jokes: &[Joke]) -> Vec<JokeView> {
        jokes.iter().map(Self::to_view).collect()
    }
}
