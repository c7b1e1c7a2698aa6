use bauplan::{Plan, Value};
use std::fmt::{self, Display, Formatter};

/// Prints a decoded record with the field names of its plan, e.g.
/// `(flag: true, label: "hi", payload: :AQID, next: null)`
pub struct Named<'a> {
    plan: &'a Plan,
    value: &'a Value,
}

impl<'a> Named<'a> {
    pub fn new(plan: &'a Plan, value: &'a Value) -> Self {
        Self { plan, value }
    }
}

impl Display for Named<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Record(fields) => {
                f.write_str("(")?;
                for (i, (binding, value)) in self.plan.bindings().iter().zip(fields).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let plan = binding.nested().map(|p| p.as_ref()).unwrap_or(self.plan);
                    write!(f, "{}: {}", binding.name(), Named::new(plan, value))?;
                }
                f.write_str(")")
            },
            Value::Ref(None)    => f.write_str("null"),
            Value::Ref(Some(v)) => write!(f, "&{}", Named::new(self.plan, v)),
            Value::Bytes(v)     => write!(f, ":{}", base64::encode(v)),
            other               => write!(f, "{}", other),
        }
    }
}

/// Prints the bindings of a plan, one per line, e.g. `id: u32 -> Int32 (big)`
pub struct Layout<'a>(pub &'a Plan);

impl Display for Layout<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0.name())?;
        for binding in self.0.bindings() {
            write!(f, "  {}: {} -> {}", binding.name(), binding.declared(), binding.kind())?;
            match (binding.nested(), binding.codec().and_then(|c| c.order())) {
                (Some(nested), _) => writeln!(f, " {}", nested.name())?,
                (None, Some(order)) => writeln!(f, " ({})", order)?,
                (None, None) => writeln!(f)?,
            }
        }
        Ok(())
    }
}
