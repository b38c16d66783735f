use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use roster_core::{BlockedImport, TemplateDetection};
use roster_map::MappingState;
use roster_model::{
    ColumnMapping, ConfidenceLevel, ImportIssue, ImportResult, IssueSeverity, MappingOrigin,
    SchemaField,
};

use roster_cli::pipeline::LoadedSchema;

/// Issues listed before the table is cut short.
const MAX_ISSUE_ROWS: usize = 50;

pub fn print_mapping(state: &MappingState, schema: &LoadedSchema) {
    println!("Event: {}", state.event_id);
    print_template_line(schema);
    println!("{}", mapping_table(&state.mappings, &state.fields));
    let summary = state.summary();
    println!(
        "Mapped {}/{} columns, {}/{} required fields covered",
        summary.mapped, summary.total_headers, summary.required_mapped, summary.required_total
    );
    let missing = state.unmapped_required();
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|field| field.label.as_str()).collect();
        eprintln!("Missing required: {}", labels.join(", "));
    }
}

pub fn print_import_summary(result: &ImportResult, schema: &LoadedSchema) {
    println!("Event: {}", result.event_id);
    println!("Intent: {}", result.intent);
    print_template_line(schema);

    let counts = &result.counts;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Created"), count_cell(counts.created, Color::Green)]);
    table.add_row(vec![Cell::new("Updated"), count_cell(counts.updated, Color::Green)]);
    table.add_row(vec![Cell::new("Merged"), count_cell(counts.merged, Color::Green)]);
    table.add_row(vec![Cell::new("Skipped"), count_cell(counts.skipped, Color::Yellow)]);
    table.add_row(vec![Cell::new("Rejected"), count_cell(counts.rejected, Color::Red)]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(counts.rows).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !result.unmapped_columns.is_empty() {
        println!("Unmapped columns: {}", result.unmapped_columns.join(", "));
    }
    if result.intent.writes_scores() && !result.scores.by_field.is_empty() {
        print_score_table(result, schema);
    }
    let issues: Vec<&ImportIssue> = result.all_issues().collect();
    print_issue_table(&issues);
}

pub fn print_blocked(blocked: &BlockedImport, schema: &LoadedSchema) {
    eprintln!("Import blocked; no rows were processed.");
    print_template_line(schema);
    println!("{}", mapping_table(&blocked.mapping, &schema.fields));
    let issues: Vec<&ImportIssue> = blocked.issues.iter().collect();
    print_issue_table(&issues);
}

fn print_template_line(schema: &LoadedSchema) {
    match (&schema.template_id, &schema.detection) {
        (_, Some(detection)) => println!("Template: {}", detection_label(detection)),
        (Some(template), None) => println!("Template: {template}"),
        (None, None) => {}
    }
}

fn detection_label(detection: &TemplateDetection) -> String {
    format!(
        "{} (detected, {} confidence, {} drill(s) matched)",
        detection.template_id,
        detection.confidence,
        detection.matched_drills.len()
    )
}

fn mapping_table(mappings: &[ColumnMapping], fields: &[SchemaField]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Field"),
        header_cell("Confidence"),
        header_cell("Score"),
        header_cell("Rule"),
        header_cell("Source"),
        header_cell("Note"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for mapping in mappings {
        let field_cell = match mapping.target() {
            Some(key) => {
                let label = fields
                    .iter()
                    .find(|field| field.key == key)
                    .map_or(key, |field| field.label.as_str());
                Cell::new(format!("{label} ({key})"))
            }
            None => dim_cell("-"),
        };
        let note = match (&mapping.conflict, &mapping.hint) {
            (Some(conflict), _) => Cell::new(conflict.to_string()).fg(Color::Yellow),
            (None, Some(hint)) => dim_cell(format!("closest: {hint}")),
            (None, None) => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&mapping.source_header),
            field_cell,
            confidence_cell(mapping.confidence),
            if mapping.is_mapped() || mapping.score > 0.0 {
                Cell::new(format!("{:.0}", mapping.score))
            } else {
                dim_cell("-")
            },
            mapping
                .rule
                .map_or_else(|| dim_cell("-"), |rule| Cell::new(rule.as_str())),
            origin_cell(mapping),
            note,
        ]);
    }
    table
}

fn print_score_table(result: &ImportResult, schema: &LoadedSchema) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Drill"),
        header_cell("Mapped"),
        header_cell("Scores"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    for (key, count) in &result.scores.by_field {
        let label = schema
            .fields
            .iter()
            .find(|field| &field.key == key)
            .map_or(key.as_str(), |field| field.label.as_str());
        let mapped = result.scores.mapped_drills.contains(key);
        let count_color = if mapped { Color::Red } else { Color::DarkGrey };
        table.add_row(vec![
            Cell::new(label),
            if mapped {
                Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                dim_cell("-")
            },
            if *count > 0 {
                Cell::new(count)
            } else {
                Cell::new(count).fg(count_color)
            },
        ]);
    }
    println!();
    println!("Scores ({} total):", result.scores.total);
    println!("{table}");
}

fn print_issue_table(issues: &[&ImportIssue]) {
    if issues.is_empty() {
        return;
    }
    let mut ordered = issues.to_vec();
    ordered.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.row.cmp(&b.row))
            .then_with(|| a.kind.cmp(&b.kind))
    });
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("Row"),
        header_cell("Field"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    for issue in ordered.iter().take(MAX_ISSUE_ROWS) {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(issue.kind.as_str()),
            issue.row.map_or_else(|| dim_cell("-"), Cell::new),
            match (&issue.field, &issue.column) {
                (Some(field), _) => Cell::new(field),
                (None, Some(column)) => Cell::new(column),
                (None, None) => dim_cell("-"),
            },
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
    if ordered.len() > MAX_ISSUE_ROWS {
        println!("... and {} more", ordered.len() - MAX_ISSUE_ROWS);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(60)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn confidence_cell(level: ConfidenceLevel) -> Cell {
    match level {
        ConfidenceLevel::High => Cell::new("HIGH").fg(Color::Green),
        ConfidenceLevel::Medium => Cell::new("MEDIUM").fg(Color::Yellow),
        ConfidenceLevel::Low => Cell::new("LOW").fg(Color::Red),
        ConfidenceLevel::None => dim_cell("-"),
    }
}

fn origin_cell(mapping: &ColumnMapping) -> Cell {
    if !mapping.is_mapped() {
        return dim_cell("-");
    }
    match mapping.origin {
        MappingOrigin::Auto => Cell::new("auto"),
        MappingOrigin::Manual => Cell::new("manual").fg(Color::Blue),
        MappingOrigin::Remembered => Cell::new("remembered").fg(Color::Blue),
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Blocking => Cell::new("BLOCK")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Error => Cell::new("ERROR").fg(Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
