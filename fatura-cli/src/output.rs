//! CSV output of the enriched record set.

use std::path::Path;

use anyhow::{Context, Result};

use fatura_core::Transaction;

/// Write the classified record set to a CSV file, one row per surviving
/// input row.
pub fn write_csv(path: impl AsRef<Path>, records: &[Transaction]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    wtr.write_record([
        "Data",
        "Lançamento",
        "Lancamento_Limpo",
        "Valor",
        "ParcelaAtual",
        "ParcelaTotal",
        "Parcela",
        "Categoria",
    ])?;

    for rec in records {
        wtr.write_record([
            rec.date.format("%Y-%m-%d").to_string(),
            rec.raw_description.clone(),
            rec.cleaned_description.clone(),
            format!("{:.2}", rec.amount),
            rec.installment
                .map(|p| p.current.to_string())
                .unwrap_or_default(),
            rec.installment
                .map(|p| p.total.to_string())
                .unwrap_or_default(),
            rec.installment_label(),
            rec.category.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
