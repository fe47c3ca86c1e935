//! `BatchCorrelationRule`: opaque SQL templates executed by the batch
//! correlator (§4.6). No expression parsing — the template is substituted
//! and executed verbatim.

use siem_store::rows::BatchCorrRuleRow;

pub struct BatchCorrelationRule {
    pub id: u64,
    pub name: String,
    pub window_s: u32,
    pub sql_template: String,
}

impl BatchCorrelationRule {
    pub fn from_row(row: BatchCorrRuleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            window_s: row.window_s,
            sql_template: row.sql_template,
        }
    }

    /// Substitutes the literal token `{WINDOW_S}` with this rule's window,
    /// per §4.6.
    pub fn render_sql(&self) -> String {
        self.sql_template.replace("{WINDOW_S}", &self.window_s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_window_token() {
        let rule = BatchCorrelationRule {
            id: 1,
            name: "test".to_string(),
            window_s: 300,
            sql_template: "INSERT INTO alerts_raw SELECT * FROM events WHERE ts > now() - {WINDOW_S}".to_string(),
        };
        assert_eq!(
            rule.render_sql(),
            "INSERT INTO alerts_raw SELECT * FROM events WHERE ts > now() - 300"
        );
    }
}
