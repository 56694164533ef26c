//! # CSV Report Formatting
//!
//! Pure string builders for the three exports: current stock, movement
//! history, and the order report. Producing the download (blob, file dialog,
//! BOM prefix) is the UI's job; this module only formats rows.
//!
//! All three use `;` as the delimiter, matching the import sheet and the
//! spreadsheets the branches already use.

use crate::types::{Movement, Order, OrderStatus, Product};

/// Code column value for system movements (no product attached).
const SYSTEM_CODE: &str = "SISTEMA";

// =============================================================================
// Stock
// =============================================================================

/// Formats the current stock collection.
///
/// ```text
/// Codigo;Produto;Qtd
/// 789101;Caneta Azul;10
/// ```
pub fn stock_csv(products: &[Product]) -> String {
    let mut out = String::from("Codigo;Produto;Qtd\n");
    for p in products {
        out.push_str(&format!("{};{};{}\n", p.id, p.name, p.qty));
    }
    out
}

// =============================================================================
// History
// =============================================================================

/// Formats the movement history.
///
/// ```text
/// Data;Codigo;Produto;Qtd;Obs;Matricula
/// 25/10/2023;789101;Caneta Azul;-3;Retirada;007
/// ```
pub fn movements_csv(movements: &[Movement]) -> String {
    let mut out = String::from("Data;Codigo;Produto;Qtd;Obs;Matricula\n");
    for m in movements {
        let date = m.date.format("%d/%m/%Y");
        let code = m.prod_id.as_deref().unwrap_or(SYSTEM_CODE);
        out.push_str(&format!(
            "{};{};{};{};{};{}\n",
            date,
            code,
            m.prod_name,
            m.qty,
            m.obs.as_deref().unwrap_or(""),
            m.matricula.as_deref().unwrap_or(""),
        ));
    }
    out
}

// =============================================================================
// Orders
// =============================================================================

/// Formats the order report.
///
/// Items are summarized into a single column as `Name(qty) | Name(qty)`;
/// the shipping column shows the chosen channel or `Pendente`.
pub fn orders_csv(orders: &[Order]) -> String {
    let mut out = String::from("Numero;Data;Cliente;Filial;Matricula;Status;Envio;Itens;Obs\n");
    for o in orders {
        let date = o.date.format("%d/%m/%Y");
        let status = match o.status {
            OrderStatus::Completed => "Concluido",
            OrderStatus::Pending => "Pendente",
        };
        let envio = if o.envio_malote {
            "Malote"
        } else if o.entrega_matriz {
            "Matriz"
        } else {
            "Pendente"
        };
        let items = o
            .items
            .iter()
            .map(|i| format!("{}({})", i.product_name, i.qty_requested))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&format!(
            "{};{};{};{};{};{};{};{};{}\n",
            o.order_number,
            date,
            o.customer_name,
            o.filial,
            o.matricula,
            status,
            envio,
            items,
            o.obs.as_deref().unwrap_or(""),
        ));
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
