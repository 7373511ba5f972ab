//! Prompt construction for statement-description classification.
//!
//! The taxonomy is rendered as an enumerated menu and the model is
//! instructed to answer with exactly one label on one line. The model's
//! answer is still passed through unvalidated downstream.

use fatura_core::Category;

const RULES: &str = "\
REGRAS IMPORTANTES:
1) Drogasil, drogaria, farmácia, Raia, Unimed, Uniodonto, OdontoPrev = \"Saúde\".
2) \"Bancos & Tarifas\" apenas para anuidade, juros, multa, IOF, encargos, rotativo, parcelamento da fatura, tarifa do cartão.
3) Se tiver parcela tipo \"01/06\", isso NÃO muda a categoria.
4) Se estiver ambíguo, use \"Compras & Casa\" como padrão; se realmente não der, use \"Outros\".
5) canva, globo, hbo, netflix, spotify, disney+, prime video, MICROSOFT, vivo, apple = \"Streaming/Assinaturas\".
6) uber, 99, ifood, rappi = \"Delivery/Restaurantes\".
7) Passei Direto, Asimov e cursos em geral são \"Educação\".
8) Mercado Livre e suas variações é \"Compras & Casa\".
9) agro, petz e afins é \"Pets\".";

/// Build the card-statement classification prompt for one description.
pub fn card_prompt(text: &str) -> String {
    let menu: String = Category::ALL
        .iter()
        .map(|c| format!("- {}\n", c.label()))
        .collect();

    format!(
        "Você é um analista de dados em um projeto de limpeza de lançamentos de CARTÃO DE CRÉDITO (pessoa física).\n\
         Sua tarefa é escolher UMA categoria para o lançamento com base no estabelecimento/descrição.\n\
         \n\
         Escolha exatamente UMA das categorias abaixo:\n\
         {menu}\
         \n\
         {RULES}\n\
         \n\
         Agora classifique este lançamento:\n\
         {text}\n\
         \n\
         Responda APENAS com o nome exato da categoria (uma linha)."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_full_menu() {
        let p = card_prompt("UBER TRIP");
        for c in Category::ALL {
            assert!(p.contains(c.label()), "menu missing {}", c.label());
        }
        assert!(p.contains("UBER TRIP"));
    }

    #[test]
    fn test_prompt_demands_single_line_answer() {
        let p = card_prompt("X");
        assert!(p.contains("APENAS com o nome exato da categoria"));
    }
}
