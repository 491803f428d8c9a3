//! Render an invoice from a `.docx` template.
//!
//! Without `--template` a small invoice template is generated in memory;
//! without `--data` a built-in invoice is used.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example invoice -- -o invoice.docx
//! cargo run --example invoice -- --template my.docx --data invoice.json -o out.docx --strict
//! RUST_LOG=quince=debug cargo run --example invoice -- -o invoice.docx
//! ```

use chrono::NaiveDate;
use clap::Parser;
use quince::ooxml::docx::scaffold::DocxBuilder;
use quince::{Accessors, Record, Template, TemplateOptions, Value};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Merge invoice data into a Word template
#[derive(Parser, Debug)]
#[command(name = "invoice", version)]
struct Args {
    /// Template to render; a built-in one is used when omitted
    #[arg(short, long, value_name = "DOCX")]
    template: Option<PathBuf>,

    /// JSON file with the data root; a built-in invoice is used when omitted
    #[arg(short, long, value_name = "JSON")]
    data: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "invoice.docx")]
    output: PathBuf,

    /// Fail on placeholders whose path resolves to nothing
    #[arg(long)]
    strict: bool,

    /// Symbol used for the ¤ pattern letter
    #[arg(long, default_value = "$")]
    currency: String,
}

const TEMPLATE_BODY: &str = concat!(
    r#"<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="32"/></w:rPr><w:t>INVOICE {{number}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t xml:space="preserve">Issued </w:t></w:r><w:r><w:t>{{issued | d MMMM yyyy}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>Bill to: {{customer.name}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>{{customer.address}}</w:t></w:r></w:p>"#,
    r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#,
    r#"<w:tblGrid><w:gridCol w:w="600"/><w:gridCol w:w="4000"/><w:gridCol w:w="1200"/><w:gridCol w:w="1800"/></w:tblGrid>"#,
    r#"<w:tr><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>#</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Item</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Qty</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Amount</w:t></w:r></w:p></w:tc></w:tr>"#,
    r#"<w:tr><w:tc><w:p><w:r><w:t>{{#lines}}{{@number}}</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:t>{{description}}</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:t>{{quantity}}</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:t>{{amount | ¤#,##0.00}}{{/lines}}</w:t></w:r></w:p></w:tc></w:tr>"#,
    r#"</w:tbl>"#,
    r#"<w:p><w:r><w:t xml:space="preserve">Total: </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>{{total | ¤#,##0.00}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>{{#paid}}Paid in full. Thank you!{{/paid}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>{{#notes}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>- {{.}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>{{/notes}}</w:t></w:r></w:p>"#
);

struct Line {
    description: &'static str,
    quantity: u32,
    unit_price: Decimal,
}

impl Line {
    fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

fn builtin_invoice() -> Value {
    let accessors = Arc::new(
        Accessors::new()
            .field("description", |l: &Line| l.description.into())
            .field("quantity", |l: &Line| l.quantity.into())
            .field("amount", |l: &Line| l.amount().into()),
    );
    let lines = vec![
        Line {
            description: "Analytical engine maintenance",
            quantity: 3,
            unit_price: Decimal::new(12_500, 2),
        },
        Line {
            description: "Punched cards (box of 500)",
            quantity: 12,
            unit_price: Decimal::new(1_999, 2),
        },
    ];
    let total: Decimal = lines.iter().map(Line::amount).sum();
    let lines: Vec<Value> = lines
        .into_iter()
        .map(|line| Value::from(Record::new(line, Arc::clone(&accessors))))
        .collect();

    Value::map([
        ("number", Value::from("2024-0042")),
        ("issued", Value::from(NaiveDate::from_ymd_opt(2024, 3, 14))),
        (
            "customer",
            Value::map([
                ("name", Value::from("Ada Lovelace")),
                ("address", Value::from("12 St James's Square\nLondon")),
            ]),
        ),
        ("lines", Value::List(lines)),
        ("total", Value::from(total)),
        ("paid", Value::Bool(false)),
        ("notes", Value::from(vec!["Payable within 30 days."])),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "quince=info".into()))
        .init();

    let args = Args::parse();
    let options = TemplateOptions::new()
        .with_strict(args.strict)
        .with_currency_symbol(args.currency);

    let template = match &args.template {
        Some(path) => Template::from_file_with_options(path, options)?,
        None => Template::from_bytes_with_options(DocxBuilder::new(TEMPLATE_BODY).build()?, options)?,
    };

    let data = match &args.data {
        Some(path) => {
            let json: serde_json::Value = serde_json::from_slice(&std::fs::read(path)?)?;
            Value::from(json)
        },
        None => builtin_invoice(),
    };

    let output = template.render(&data)?;
    output.write_to_file(&args.output)?;
    println!(
        "Wrote {} ({} bytes, {} placeholders)",
        args.output.display(),
        output.len(),
        template.placeholder_count()
    );
    Ok(())
}
