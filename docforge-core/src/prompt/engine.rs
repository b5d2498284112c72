use super::PromptError;
use tera::Tera;

/// Tera-backed engine holding the registered prompt templates.
#[derive(Clone)]
pub(crate) struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create an empty engine with no filesystem templates.
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Register a template from a string. Overwrites silently, which keeps
    /// registration idempotent.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), PromptError> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, PromptError> {
        Ok(self.tera.render(name, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn add_template_and_render() {
        let mut engine = TemplateEngine::new();
        engine.add_template("greeting", "Hello, {{ name }}!").unwrap();

        let mut ctx = Context::new();
        ctx.insert("name", "World");
        assert_eq!(engine.render("greeting", &ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn render_unknown_template_fails() {
        let engine = TemplateEngine::new();
        assert!(engine.render("missing", &Context::new()).is_err());
    }

    #[test]
    fn empty_string_is_falsy_in_conditionals() {
        let mut engine = TemplateEngine::new();
        engine
            .add_template("cond", "{% if section %}has section{% endif %}")
            .unwrap();

        let mut ctx = Context::new();
        ctx.insert("section", "");
        assert_eq!(engine.render("cond", &ctx).unwrap(), "");

        let mut ctx = Context::new();
        ctx.insert("section", "x");
        assert_eq!(engine.render("cond", &ctx).unwrap(), "has section");
    }
}
