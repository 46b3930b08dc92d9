use garde::Validate;

#[derive(Validate, Clone, Debug)]
pub struct ValidatedEmail(
    #[garde(email)]
    pub(crate) String
);

impl ValidatedEmail {
    pub fn parse(s: &str) -> Result<Self, garde::Report> {
        let email = ValidatedEmail(s.trim().to_string());
        email.validate()?;
        Ok(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
