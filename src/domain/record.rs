/// Lower-cased view of one visible inbox row. Built fresh on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub sender_name: String,
    pub sender_address: String,
    pub subject: String,
    pub snippet: String,
}

impl Record {
    pub fn new(sender_name: &str, sender_address: &str, subject: &str, snippet: &str) -> Self {
        Self {
            sender_name: sender_name.to_lowercase(),
            sender_address: sender_address.to_lowercase(),
            subject: subject.to_lowercase(),
            snippet: snippet.to_lowercase(),
        }
    }
}
