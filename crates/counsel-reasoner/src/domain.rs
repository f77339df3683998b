//! Per-domain handlers: planning guidance, retrieval hints and synthesis focus

use counsel_domain::DomainKind;

/// Domain-specific behaviour plugged into the pipeline
pub trait DomainHandler: Send + Sync {
    /// Domain this handler serves
    fn kind(&self) -> DomainKind;

    /// Extra instructions for the planning call
    fn planning_guidance(&self) -> &'static str;

    /// Terms appended to RETRIEVE queries
    fn retrieval_hint(&self) -> &'static str;

    /// What the synthesis should emphasise
    fn synthesis_focus(&self) -> &'static str;
}

/// Contract formation, interpretation and enforceability
pub struct ContractHandler;

/// Disputes, procedure and remedies
pub struct LitigationHandler;

/// Patents, copyright, trademarks and trade secrets
pub struct IntellectualPropertyHandler;

/// Statutory and agency compliance
pub struct RegulatoryHandler;

/// Fallback for questions with no clearer domain
pub struct GeneralHandler;

impl DomainHandler for ContractHandler {
    fn kind(&self) -> DomainKind {
        DomainKind::Contract
    }

    fn planning_guidance(&self) -> &'static str {
        "Identify the governing statute or doctrine for the clause at issue, check for \
         statutory exceptions, and interpret the contract language within its four corners \
         before applying the rule."
    }

    fn retrieval_hint(&self) -> &'static str {
        "contract"
    }

    fn synthesis_focus(&self) -> &'static str {
        "enforceability of the contract terms and any exceptions that apply"
    }
}

impl DomainHandler for LitigationHandler {
    fn kind(&self) -> DomainKind {
        DomainKind::Litigation
    }

    fn planning_guidance(&self) -> &'static str {
        "Separate procedural questions (jurisdiction, standing, deadlines) from the merits, \
         and identify the controlling precedent for each."
    }

    fn retrieval_hint(&self) -> &'static str {
        "court holding"
    }

    fn synthesis_focus(&self) -> &'static str {
        "likely outcome, available remedies and procedural risks"
    }
}

impl DomainHandler for IntellectualPropertyHandler {
    fn kind(&self) -> DomainKind {
        DomainKind::IntellectualProperty
    }

    fn planning_guidance(&self) -> &'static str {
        "Determine which form of protection applies, then address ownership, scope of the \
         right, infringement and available defenses in that order."
    }

    fn retrieval_hint(&self) -> &'static str {
        "intellectual property"
    }

    fn synthesis_focus(&self) -> &'static str {
        "scope of the protected right and infringement exposure"
    }
}

impl DomainHandler for RegulatoryHandler {
    fn kind(&self) -> DomainKind {
        DomainKind::Regulatory
    }

    fn planning_guidance(&self) -> &'static str {
        "Identify the regulating statute and agency, the obligations it imposes on the party, \
         and any thresholds or exemptions that decide whether it applies."
    }

    fn retrieval_hint(&self) -> &'static str {
        "regulation"
    }

    fn synthesis_focus(&self) -> &'static str {
        "compliance obligations and the consequences of non-compliance"
    }
}

impl DomainHandler for GeneralHandler {
    fn kind(&self) -> DomainKind {
        DomainKind::General
    }

    fn planning_guidance(&self) -> &'static str {
        "Identify the legal issue, retrieve the governing authority, and apply it to the facts."
    }

    fn retrieval_hint(&self) -> &'static str {
        ""
    }

    fn synthesis_focus(&self) -> &'static str {
        "a clear answer to the question as asked"
    }
}

/// Handler for a domain kind
pub fn handler_for(kind: DomainKind) -> &'static dyn DomainHandler {
    match kind {
        DomainKind::Contract => &ContractHandler,
        DomainKind::Litigation => &LitigationHandler,
        DomainKind::IntellectualProperty => &IntellectualPropertyHandler,
        DomainKind::Regulatory => &RegulatoryHandler,
        DomainKind::General => &GeneralHandler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::Question;

    #[test]
    fn test_one_handler_per_kind() {
        for kind in DomainKind::ALL {
            assert_eq!(handler_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_inferred_question_dispatch() {
        let question = Question::new("Is a non-compete clause enforceable in California?").unwrap();
        assert_eq!(handler_for(question.domain()).kind(), DomainKind::Contract);

        let question = Question::new("Does our logo infringe their trademark?").unwrap();
        assert_eq!(
            handler_for(question.domain()).kind(),
            DomainKind::IntellectualProperty
        );
    }

    #[test]
    fn test_general_handler_adds_no_hint() {
        assert!(handler_for(DomainKind::General).retrieval_hint().is_empty());
    }
}
