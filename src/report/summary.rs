//! Console rendering of adverse impact reports

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use super::impact_report::{AdverseImpactReport, ReportRow};

impl AdverseImpactReport {
    /// Render the per-group results as a table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Group").add_attribute(Attribute::Bold),
            Cell::new("N").add_attribute(Attribute::Bold),
            Cell::new("Selection Rate").add_attribute(Attribute::Bold),
            Cell::new("Impact Ratio").add_attribute(Attribute::Bold),
            Cell::new("p-value").add_attribute(Attribute::Bold),
        ]);

        for row in self.rows() {
            table.add_row(row_cells(&row));
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("⚖️").cyan(),
            style("ADVERSE IMPACT").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!(
            "      {} {}   {} {}",
            style("Groups:").dim(),
            self.config.group_column,
            style("Outcome:").dim(),
            self.config.outcome_column
        );
        println!(
            "      {} {}   {} {}",
            style("Pass rule:").dim(),
            self.config.rule,
            style("Referent:").dim(),
            style(self.referent()).green().bold()
        );
        if self.records_filtered() > 0 {
            println!(
                "      {} {} of {} records",
                style("Filtered out:").dim(),
                self.records_filtered(),
                self.records_input
            );
        }
        println!();

        // Indent the table
        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        let violations = self.four_fifths_violations();
        let significant = self.significant_differences();

        println!();
        if violations.is_empty() && significant.is_empty() {
            println!(
                "    {} {}",
                style("✓").green(),
                style("No group shows adverse impact").green()
            );
            return;
        }

        if !violations.is_empty() {
            println!(
                "      {} {}:",
                style("Below four-fifths").yellow(),
                style(format!("({})", violations.len())).dim()
            );
            for group in &violations {
                println!("        {} {}", style("•").dim(), group);
            }
        }

        if !significant.is_empty() {
            println!(
                "      {} {}:",
                style("Significant difference").yellow(),
                style(format!("({})", significant.len())).dim()
            );
            for group in &significant {
                println!("        {} {}", style("•").dim(), group);
            }
        }
    }
}

fn row_cells(row: &ReportRow) -> Vec<Cell> {
    let group = if row.is_referent {
        Cell::new(format!("{} (referent)", row.group)).add_attribute(Attribute::Bold)
    } else {
        Cell::new(&row.group)
    };

    let ratio = Cell::new(format!("{:.3}", row.impact_ratio)).fg(if row.four_fifths_violation {
        Color::Red
    } else {
        Color::Green
    });

    let p_value = match row.p_value {
        Some(p) => Cell::new(format!("{:.4}", p)).fg(if row.significant {
            Color::Red
        } else {
            Color::White
        }),
        None => Cell::new("-").fg(Color::DarkGrey),
    };

    vec![
        group,
        Cell::new(row.sample_size),
        Cell::new(format!("{:.1}%", row.selection_rate * 100.0)),
        ratio,
        p_value,
    ]
}
