#![forbid(unsafe_code)]

/// Permitted value space of a property.
///
/// Bounds are inclusive; `None` means unbounded on that side. The parser
/// always produces `Alias { resolved: None, .. }`; resolution is the
/// completer's job.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    String {
        min_len: Option<u64>,
        max_len: Option<u64>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Enum(Vec<String>),
    /// Every pattern must match.
    Pattern(Vec<String>),
    Date,
    Timestamp {
        format: Option<String>,
    },
    Uuid,
    Vector {
        dimensions: u32,
    },
    List {
        element: Box<Constraint>,
        min_len: Option<u64>,
        max_len: Option<u64>,
    },
    /// Named datatype, possibly qualified (`alias.Name`).
    Alias {
        name: String,
        resolved: Option<Box<Constraint>>,
    },
}

impl Constraint {
    pub fn string() -> Self {
        Constraint::String {
            min_len: None,
            max_len: None,
        }
    }

    pub fn integer() -> Self {
        Constraint::Integer {
            min: None,
            max: None,
        }
    }

    pub fn integer_range(min: i64, max: i64) -> Self {
        Constraint::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn float() -> Self {
        Constraint::Float {
            min: None,
            max: None,
        }
    }

    pub fn timestamp() -> Self {
        Constraint::Timestamp { format: None }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn list_of(element: Constraint) -> Self {
        Constraint::List {
            element: Box::new(element),
            min_len: None,
            max_len: None,
        }
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Constraint::Alias {
            name: name.into(),
            resolved: None,
        }
    }

    /// Follows resolved alias links down to the first concrete constraint, or
    /// to the first alias that is still unresolved.
    pub fn deref(&self) -> &Constraint {
        let mut cur = self;
        while let Constraint::Alias {
            resolved: Some(inner),
            ..
        } = cur
        {
            cur = inner;
        }
        cur
    }

    pub fn is_unresolved_alias(&self) -> bool {
        matches!(self.deref(), Constraint::Alias { resolved: None, .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::String { .. } => "String",
            Constraint::Integer { .. } => "Integer",
            Constraint::Float { .. } => "Float",
            Constraint::Boolean => "Boolean",
            Constraint::Enum(_) => "Enum",
            Constraint::Pattern(_) => "Pattern",
            Constraint::Date => "Date",
            Constraint::Timestamp { .. } => "Timestamp",
            Constraint::Uuid => "UUID",
            Constraint::Vector { .. } => "Vector",
            Constraint::List { .. } => "List",
            Constraint::Alias { .. } => "Alias",
        }
    }

    pub fn display(&self) -> String {
        fn bounds<T: ToString>(lo: &Option<T>, hi: &Option<T>) -> String {
            match (lo, hi) {
                (None, None) => String::new(),
                (lo, hi) => {
                    let lo = lo.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "_".into());
                    let hi = hi.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "_".into());
                    format!("[{lo}, {hi}]")
                }
            }
        }

        match self {
            Constraint::String { min_len, max_len } => format!("String{}", bounds(min_len, max_len)),
            Constraint::Integer { min, max } => format!("Integer{}", bounds(min, max)),
            Constraint::Float { min, max } => format!("Float{}", bounds(min, max)),
            Constraint::Boolean => "Boolean".to_string(),
            Constraint::Enum(values) => {
                let vals = values
                    .iter()
                    .map(|v| format!("{v:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Enum[{vals}]")
            }
            Constraint::Pattern(patterns) => {
                let pats = patterns
                    .iter()
                    .map(|p| format!("{p:?}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Pattern[{pats}]")
            }
            Constraint::Date => "Date".to_string(),
            Constraint::Timestamp { format: None } => "Timestamp".to_string(),
            Constraint::Timestamp { format: Some(f) } => format!("Timestamp[{f:?}]"),
            Constraint::Uuid => "UUID".to_string(),
            Constraint::Vector { dimensions } => format!("Vector[{dimensions}]"),
            Constraint::List {
                element,
                min_len,
                max_len,
            } => format!("List<{}>{}", element.display(), bounds(min_len, max_len)),
            Constraint::Alias { name, .. } => name.clone(),
        }
    }
}
