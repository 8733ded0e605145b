use crate::db::category_translations::CategoryTranslationMap;
use crate::prompts::{FewShotExample, PromptError};
use minijinja::{context, AutoEscape, Environment};

/// Sentence the model must answer with when the schema cannot answer the question.
pub const REFUSAL_MESSAGE: &str = "SQL query cannot be written for this.";

/// Expansion output meaning the question names no product category.
pub const NO_CATEGORY_EXPANSION: &str =
    "This query does not contain any product categories to expand.";

const SYSTEM_PROMPT: &str = include_str!("../../templates/system_prompt.txt");
const USER_PROMPT: &str = include_str!("../../templates/user_prompt.txt");
const CATEGORY_PROMPT: &str = include_str!("../../templates/category_prompt.txt");

fn environment() -> Result<Environment<'static>, PromptError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    // Prompts are plain text; schema and questions must come through unescaped.
    env.set_auto_escape_callback(|_| AutoEscape::None);

    env.add_template("system_prompt.txt", SYSTEM_PROMPT)?;
    env.add_template("user_prompt.txt", USER_PROMPT)?;
    env.add_template("category_prompt.txt", CATEGORY_PROMPT)?;

    Ok(env)
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, PromptError> {
    let env = environment()?;
    let template = env.get_template(name)?;
    Ok(template.render(ctx)?)
}

/// Renders the system prompt: role, guidelines, the schema verbatim, the
/// optional category note and the few-shot examples.
pub fn render_system_prompt(
    schema: &str,
    examples: &[FewShotExample],
    category_hint: Option<&str>,
    dialect: &str,
) -> Result<String, PromptError> {
    let examples: Vec<String> = examples.iter().map(FewShotExample::render).collect();

    render(
        "system_prompt.txt",
        context! {
            schema => schema,
            examples => examples,
            category_hint => category_hint,
            dialect => dialect,
            refusal => REFUSAL_MESSAGE,
        },
    )
}

pub fn render_user_prompt(question: &str) -> Result<String, PromptError> {
    render("user_prompt.txt", context! { question => question })
}

/// Renders the category expansion system prompt listing every known translation.
pub fn render_category_prompt(categories: &CategoryTranslationMap) -> Result<String, PromptError> {
    let categories: Vec<(&str, &str)> = categories
        .iter()
        .map(|(english, local)| (english.as_str(), local.as_str()))
        .collect();

    render(
        "category_prompt.txt",
        context! {
            categories => categories,
            sentinel => NO_CATEGORY_EXPANSION,
        },
    )
}
