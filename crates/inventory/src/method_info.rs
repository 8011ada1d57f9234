//! Bilingual (English/Arabic) display metadata for valuation methods.

use serde::Serialize;

use costledger_products::ValuationMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationMethodInfo {
    pub method: ValuationMethod,
    pub name: &'static str,
    pub name_ar: &'static str,
    pub description: &'static str,
    pub description_ar: &'static str,
}

const WEIGHTED_AVERAGE: ValuationMethodInfo = ValuationMethodInfo {
    method: ValuationMethod::WeightedAverage,
    name: "Weighted Average",
    name_ar: "المتوسط المرجح",
    description: "Cost is the total stock value divided by the total quantity, recomputed on every receipt.",
    description_ar: "التكلفة هي إجمالي قيمة المخزون مقسومة على إجمالي الكمية، ويعاد حسابها مع كل استلام.",
};

const FIFO: ValuationMethodInfo = ValuationMethodInfo {
    method: ValuationMethod::Fifo,
    name: "First In, First Out (FIFO)",
    name_ar: "الوارد أولاً صادر أولاً",
    description: "The oldest cost layers are issued first; each receipt is kept as its own layer.",
    description_ar: "تصرف أقدم طبقات التكلفة أولاً، وتحفظ كل عملية استلام كطبقة مستقلة.",
};

const LIFO: ValuationMethodInfo = ValuationMethodInfo {
    method: ValuationMethod::Lifo,
    name: "Last In, First Out (LIFO)",
    name_ar: "الوارد أخيراً صادر أولاً",
    description: "The newest cost layers are issued first; each receipt is kept as its own layer.",
    description_ar: "تصرف أحدث طبقات التكلفة أولاً، وتحفظ كل عملية استلام كطبقة مستقلة.",
};

const MOVING_AVERAGE: ValuationMethodInfo = ValuationMethodInfo {
    method: ValuationMethod::MovingAverage,
    name: "Moving Average",
    name_ar: "المتوسط المتحرك",
    description: "The average unit cost moves with each purchase and is applied to every issue until the next one.",
    description_ar: "يتغير متوسط تكلفة الوحدة مع كل عملية شراء ويطبق على كل صرف حتى الشراء التالي.",
};

/// Metadata for `method`.
pub fn method_info(method: ValuationMethod) -> &'static ValuationMethodInfo {
    match method {
        ValuationMethod::WeightedAverage => &WEIGHTED_AVERAGE,
        ValuationMethod::Fifo => &FIFO,
        ValuationMethod::Lifo => &LIFO,
        ValuationMethod::MovingAverage => &MOVING_AVERAGE,
    }
}

/// Metadata for a raw method tag; unknown tags get the Weighted Average entry.
pub fn method_info_for_tag(tag: &str) -> &'static ValuationMethodInfo {
    method_info(ValuationMethod::parse_or_default(tag))
}

/// Metadata for every method, in canonical order.
pub fn all_method_info() -> Vec<&'static ValuationMethodInfo> {
    ValuationMethod::ALL.into_iter().map(method_info).collect()
}
