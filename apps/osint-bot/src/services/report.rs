use crate::models::lookup::{LookupResult, NOT_AVAILABLE};
use crate::models::phone::PhoneNumber;
use crate::utils::truncate_chars;

/// Present in every rendered result message; the menu handler keeps such
/// messages instead of deleting them.
pub const RESULTS_MARKER: &str = "SEARCH RESULTS AVAILABLE";

/// What happened to one alternate number found in the primary results.
#[derive(Debug, Clone, PartialEq)]
pub enum AlternateLookup {
    Found {
        number: PhoneNumber,
        results: Vec<LookupResult>,
        timestamp: String,
    },
    Empty {
        number: PhoneNumber,
    },
    Failed {
        number: PhoneNumber,
        reason: String,
    },
    /// Not looked up: the balance could not cover it.
    Unaffordable {
        number: PhoneNumber,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub number: PhoneNumber,
    pub results: Vec<LookupResult>,
    pub alternates: Vec<AlternateLookup>,
    pub credits_remaining: i64,
    pub timestamp: String,
    /// Whether the primary number was charged by this search.
    pub charged: bool,
}

impl SearchReport {
    pub fn render(&self) -> String {
        let mut output = format!("✅ {}! 📡\n\n", RESULTS_MARKER);
        output.push_str(&format!("📱 Search Results ({} found)\n\n", self.results.len()));
        render_results(&mut output, &self.results);

        for alternate in &self.alternates {
            match alternate {
                AlternateLookup::Found {
                    number,
                    results,
                    timestamp,
                } => {
                    output.push_str(&format!(
                        "🔁 Alt Search Results for {} ({} found):\n\n",
                        number,
                        results.len()
                    ));
                    render_results(&mut output, results);
                    output.push_str(&format!("⏰ Alt searched on: {}\n\n", timestamp));
                }
                AlternateLookup::Empty { number } => {
                    output.push_str(&format!("❌ No results for alt number {}.\n\n", number));
                }
                AlternateLookup::Failed { number, reason } => {
                    output.push_str(&format!(
                        "❌ Alt search failed for {}: {}\n\n",
                        number,
                        truncate_chars(reason, 50)
                    ));
                }
                AlternateLookup::Unaffordable { number } => {
                    output.push_str(&format!(
                        "⚠️ Skipped alt number {}: not enough credits.\n\n",
                        number
                    ));
                }
            }
        }

        output.push_str(&format!("💳 Credits Remaining: {}\n", self.credits_remaining));
        output.push_str(&format!("⏰ Searched on: {}", self.timestamp));
        output
    }
}

fn render_results(output: &mut String, results: &[LookupResult]) {
    for (idx, item) in results.iter().enumerate() {
        output.push_str(&format!("Result {}:\n====================\n", idx + 1));
        output.push_str(&format!("📱 Mobile: {}\n", item.mobile));
        output.push_str(&format!("👤 Name: {}\n", item.name));
        output.push_str(&format!("👨 Father's Name: {}\n", item.father_name));
        output.push_str(&format!("🏠 Address: {}\n", item.address));
        output.push_str(&format!(
            "📞 Alternate: {}\n",
            item.alternate.as_deref().unwrap_or(NOT_AVAILABLE)
        ));
        output.push_str(&format!("🌐 Circle: {}\n", item.circle));
        output.push_str(&format!("🆔 Aadhar: {}\n", item.id_number));
        if let Some(email) = &item.email {
            output.push_str(&format!("📧 Email: {}\n", email));
        }
        output.push('\n');
    }
}
