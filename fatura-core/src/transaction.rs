//! Transaction record types and the fixed spending-category taxonomy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validated installment position extracted from a description.
///
/// Both fields are always present together; construction goes through
/// [`crate::installment::extract_installment`], which guarantees
/// `total >= 2` and `1 <= current <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub current: u32,
    pub total: u32,
}

impl Installment {
    /// Zero-padded `CC/TT` label, e.g. `01/06`.
    pub fn label(&self) -> String {
        format!("{:02}/{:02}", self.current, self.total)
    }
}

/// A fully processed statement entry.
///
/// Identity is positional within the run's record set; duplicate
/// descriptions are expected and retained independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Description as it appeared on the statement.
    pub raw_description: String,
    /// Description with installment markers and whitespace runs removed.
    pub cleaned_description: String,
    /// Negative = charge/expense; positive = credit.
    pub amount: f64,
    pub installment: Option<Installment>,
    /// Label returned by the classifier, passed through unvalidated.
    pub category: Option<String>,
}

impl Transaction {
    /// Formatted installment label, empty when the entry is not installed.
    pub fn installment_label(&self) -> String {
        self.installment.map(|p| p.label()).unwrap_or_default()
    }
}

/// Fixed card-spending taxonomy presented to the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Moradia")]
    Moradia,
    #[serde(rename = "Contas da casa")]
    ContasDaCasa,
    #[serde(rename = "Internet & Telefone")]
    InternetTelefone,
    #[serde(rename = "Streaming/Assinaturas")]
    Streaming,
    #[serde(rename = "Carro")]
    Carro,
    #[serde(rename = "Transporte")]
    Transporte,
    #[serde(rename = "Mercado")]
    Mercado,
    #[serde(rename = "Delivery/Restaurantes")]
    DeliveryRestaurantes,
    #[serde(rename = "Saúde")]
    Saude,
    #[serde(rename = "Educação")]
    Educacao,
    #[serde(rename = "Pets")]
    Pets,
    #[serde(rename = "Beleza")]
    Beleza,
    #[serde(rename = "Compras & Casa")]
    ComprasCasa,
    #[serde(rename = "Lazer")]
    Lazer,
    #[serde(rename = "Bancos & Tarifas")]
    BancosTarifas,
    #[serde(rename = "Outros")]
    Outros,
    #[serde(rename = "Reembolsos & Créditos")]
    ReembolsosCreditos,
}

impl Category {
    /// All taxonomy members, in the order they appear in the prompt menu.
    pub const ALL: [Category; 17] = [
        Category::Moradia,
        Category::ContasDaCasa,
        Category::InternetTelefone,
        Category::Streaming,
        Category::Carro,
        Category::Transporte,
        Category::Mercado,
        Category::DeliveryRestaurantes,
        Category::Saude,
        Category::Educacao,
        Category::Pets,
        Category::Beleza,
        Category::ComprasCasa,
        Category::Lazer,
        Category::BancosTarifas,
        Category::Outros,
        Category::ReembolsosCreditos,
    ];

    /// Display label, exactly as offered to the classifier.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Moradia => "Moradia",
            Category::ContasDaCasa => "Contas da casa",
            Category::InternetTelefone => "Internet & Telefone",
            Category::Streaming => "Streaming/Assinaturas",
            Category::Carro => "Carro",
            Category::Transporte => "Transporte",
            Category::Mercado => "Mercado",
            Category::DeliveryRestaurantes => "Delivery/Restaurantes",
            Category::Saude => "Saúde",
            Category::Educacao => "Educação",
            Category::Pets => "Pets",
            Category::Beleza => "Beleza",
            Category::ComprasCasa => "Compras & Casa",
            Category::Lazer => "Lazer",
            Category::BancosTarifas => "Bancos & Tarifas",
            Category::Outros => "Outros",
            Category::ReembolsosCreditos => "Reembolsos & Créditos",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installment_label_zero_padded() {
        let p = Installment { current: 1, total: 6 };
        assert_eq!(p.label(), "01/06");

        let p = Installment { current: 11, total: 12 };
        assert_eq!(p.label(), "11/12");
    }

    #[test]
    fn test_category_labels_are_distinct() {
        let mut labels: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Category::ALL.len());
    }

    #[test]
    fn test_category_serde_uses_label() {
        let json = serde_json::to_string(&Category::ReembolsosCreditos).unwrap();
        assert_eq!(json, "\"Reembolsos & Créditos\"");
    }

    #[test]
    fn test_transaction_label_empty_without_installment() {
        let t = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            raw_description: "MERCADO X".to_string(),
            cleaned_description: "MERCADO X".to_string(),
            amount: -50.0,
            installment: None,
            category: None,
        };
        assert_eq!(t.installment_label(), "");
    }
}
