// src/common/validation.rs

// Validações de domínio que dependem de dados do banco (dono, hierarquia).
// O serviço carrega as referências e estas funções montam os `ValidationErrors`
// campo a campo, no mesmo formato das validações do `validator`.

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::costing::ResourceRef;

/// Dono de uma linha referenciada e, quando houver, o seu pai hierárquico
/// (rubro do subrubro, equipo da referência, tipo da categoria).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct RefOwner {
    pub company_id: Uuid,
    pub parent_id: Option<Uuid>,
}

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

// ---
// Acumulador de erros de escopo de empresa
// ---
pub struct CompanyScope {
    company_id: Uuid,
    errors: ValidationErrors,
}

impl CompanyScope {
    pub fn new(company_id: Uuid) -> Self {
        Self { company_id, errors: ValidationErrors::new() }
    }

    /// Referência obrigatória: precisa existir e pertencer à empresa ativa.
    pub fn owned(&mut self, field: &'static str, owner: Option<RefOwner>) -> &mut Self {
        match owner {
            None => self.errors.add(field, field_error("not_found", "Registro não encontrado.")),
            Some(o) if o.company_id != self.company_id => self.errors.add(
                field,
                field_error("company_mismatch", "O registro não pertence à empresa ativa."),
            ),
            Some(_) => {}
        }
        self
    }

    /// Referência opcional: só valida quando o id foi informado.
    pub fn owned_opt(&mut self, field: &'static str, id: Option<Uuid>, owner: Option<RefOwner>) -> &mut Self {
        if id.is_some() {
            self.owned(field, owner);
        }
        self
    }

    /// O filho precisa pertencer ao pai informado no mesmo registro.
    pub fn belongs_to(
        &mut self,
        field: &'static str,
        child: Option<RefOwner>,
        parent_id: Uuid,
        message: &'static str,
    ) -> &mut Self {
        if let Some(c) = child {
            if c.parent_id != Some(parent_id) {
                self.errors.add(field, field_error("parent_mismatch", message));
            }
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

// --- Mensagens de hierarquia usadas pelos serviços ---
pub const SUB_TRADE_NOT_IN_TRADE: &str = "O subrubro selecionado não pertence ao rubro indicado.";
pub const CREW_REF_NOT_IN_CREW: &str = "A referência não pertence ao equipo indicado.";
pub const CATEGORY_NOT_IN_TYPE: &str = "A categoria não pertence ao tipo indicado.";

/// Linha de tarefa: exatamente um recurso e quantidade positiva.
pub fn validate_resource_line(
    material_id: Option<Uuid>,
    labor_id: Option<Uuid>,
    subcontract_id: Option<Uuid>,
    mixture_id: Option<Uuid>,
    quantity: Decimal,
) -> Result<ResourceRef, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let resource = ResourceRef::from_columns(material_id, labor_id, subcontract_id, mixture_id);
    if resource.is_none() {
        errors.add(
            "resource",
            field_error(
                "exactly_one_resource",
                "Informe exatamente um recurso: material, mão de obra, subcontrato ou mistura.",
            ),
        );
    }
    if quantity <= Decimal::ZERO {
        errors.add("quantity", field_error("quantity_gt_zero", "A quantidade deve ser maior que zero."));
    }

    match resource {
        Some(r) if errors.is_empty() => Ok(r),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn owner(company_id: Uuid, parent_id: Option<Uuid>) -> Option<RefOwner> {
        Some(RefOwner { company_id, parent_id })
    }

    #[test]
    fn foreign_company_reference_is_rejected_by_field() {
        let company = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut scope = CompanyScope::new(company);
        scope
            .owned("tradeId", owner(company, None))
            .owned("providerId", owner(other, None))
            .owned("unitId", None);

        let errors = scope.finish().unwrap_err();
        let fields = errors.field_errors();
        assert!(!fields.contains_key("tradeId"));
        assert_eq!(fields["providerId"][0].code, "company_mismatch");
        assert_eq!(fields["unitId"][0].code, "not_found");
    }

    #[test]
    fn optional_reference_is_skipped_when_absent() {
        let mut scope = CompanyScope::new(Uuid::new_v4());
        scope.owned_opt("providerId", None, None);
        assert!(scope.finish().is_ok());
    }

    #[test]
    fn sub_trade_must_belong_to_trade() {
        let company = Uuid::new_v4();
        let trade = Uuid::new_v4();
        let other_trade = Uuid::new_v4();

        let mut ok = CompanyScope::new(company);
        ok.belongs_to("subTradeId", owner(company, Some(trade)), trade, SUB_TRADE_NOT_IN_TRADE);
        assert!(ok.finish().is_ok());

        let mut bad = CompanyScope::new(company);
        bad.belongs_to("subTradeId", owner(company, Some(other_trade)), trade, SUB_TRADE_NOT_IN_TRADE);
        let errors = bad.finish().unwrap_err();
        assert_eq!(errors.field_errors()["subTradeId"][0].code, "parent_mismatch");
    }

    #[test]
    fn resource_line_needs_exactly_one_resource() {
        let a = Some(Uuid::new_v4());
        let b = Some(Uuid::new_v4());

        assert!(validate_resource_line(a, None, None, None, dec!(1)).is_ok());
        assert!(validate_resource_line(a, b, None, None, dec!(1)).is_err());
        assert!(validate_resource_line(None, None, None, None, dec!(1)).is_err());
    }

    #[test]
    fn resource_line_needs_positive_quantity() {
        let a = Some(Uuid::new_v4());
        let errors = validate_resource_line(None, None, None, a, Decimal::ZERO).unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
        assert!(validate_resource_line(None, None, None, a, dec!(-2)).is_err());
    }
}
