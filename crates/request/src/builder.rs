use {
    panelio_config::RequestConfig,
    panelio_protocol::{
        Analytics, CallDescriptor, DEFAULT_PAGE_SIZE, DialectId, Error, FilterRule, PAGE_SIZE_ALL,
        PASSTHROUGH_FUNC, PASSTHROUGH_VERSION_ARG, Paginate, RequestMeta, Result, SortRule, coerce,
    },
    serde_json::{Map, Value},
    tracing::trace,
};

use crate::AutoCounter;

/// Options for [`RequestBuilder::initialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Send the arguments as a JSON body instead of form encoding.
    pub json: bool,
    /// WHM v1 only: treat the module as a real namespace, calling
    /// `Module/func` instead of prefixing `module_`.
    pub real_namespaces: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Accumulates one call. Every mutator returns `&mut Self` (wrapped in a
/// `Result` where it can fail) so calls chain.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    dialect: DialectId,
    pub module: Option<String>,
    pub func: String,
    /// Call arguments. Public so callers may replace it outright; argument
    /// mutators refuse to run unless it is an object.
    pub args: Value,
    pub meta: RequestMeta,
    pub json: bool,
    analytics: Option<Analytics>,
    nested_dialect: Option<DialectId>,
    auto_counter: AutoCounter,
    defaults: RequestConfig,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(dialect: DialectId) -> Self {
        Self::with_config(dialect, RequestConfig::default())
    }

    #[must_use]
    pub fn with_config(dialect: DialectId, defaults: RequestConfig) -> Self {
        Self {
            dialect,
            module: None,
            func: String::new(),
            args: Value::Object(Map::new()),
            meta: empty_meta(&defaults),
            json: false,
            analytics: None,
            nested_dialect: None,
            auto_counter: AutoCounter::default(),
            defaults,
        }
    }

    #[must_use]
    pub fn whm_v1() -> Self {
        Self::new(DialectId::WhmV1)
    }

    #[must_use]
    pub fn uapi() -> Self {
        Self::new(DialectId::Uapi)
    }

    #[must_use]
    pub fn api2() -> Self {
        Self::new(DialectId::Api2)
    }

    #[must_use]
    pub fn dialect(&self) -> DialectId {
        self.dialect
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.dialect.version()
    }

    /// Sets module and function, replaces the arguments and meta, and sets
    /// the JSON flag. An empty module means "no module".
    pub fn initialize(
        &mut self,
        module: impl Into<String>,
        func: impl Into<String>,
        data: Option<Value>,
        meta: Option<RequestMeta>,
        options: InitOptions,
    ) -> Result<&mut Self> {
        let module = Some(module.into()).filter(|m| !m.is_empty());
        let func = func.into();
        (self.module, self.func) = match module {
            Some(module) if options.real_namespaces && self.dialect == DialectId::WhmV1 => {
                (None, format!("{module}/{func}"))
            },
            module => (module, func),
        };
        self.set_arguments(data.unwrap_or_else(|| Value::Object(Map::new())))?;
        self.meta = meta.unwrap_or_else(|| empty_meta(&self.defaults));
        self.json = options.json;
        Ok(self)
    }

    /// Replaces the arguments wholesale. Unlike [`Self::add_argument`] the
    /// value may hold anything JSON can, as long as the top level is an object.
    pub fn set_arguments(&mut self, args: Value) -> Result<&mut Self> {
        if !args.is_object() {
            return Err(Error::ArgsNotMapping {
                method: "set_arguments",
            });
        }
        self.args = args;
        Ok(self)
    }

    /// Sets `args[name]`, or with `auto` sets `args[name + n]` where `n`
    /// counts up per name from the seed.
    pub fn add_argument(&mut self, name: &str, value: impl Into<Value>, auto: bool) -> Result<&mut Self> {
        self.args_mut("add_argument")?;
        let key = if auto {
            let suffix = self.auto_counter.suffix(name);
            self.auto_counter.increment(name);
            format!("{name}{suffix}")
        } else {
            name.to_string()
        };
        self.args_mut("add_argument")?.insert(key, value.into());
        Ok(self)
    }

    /// Removes `args[name]`, or with `auto` the most recent auto-suffixed
    /// `name`.
    pub fn remove_argument(&mut self, name: &str, auto: bool) -> Result<&mut Self> {
        self.args_mut("remove_argument")?;
        let key = if auto {
            format!("{name}{}", self.auto_counter.decrement(name))
        } else {
            name.to_string()
        };
        self.args_mut("remove_argument")?.shift_remove(&key);
        Ok(self)
    }

    /// Empties the arguments and resets every auto counter to the seed.
    pub fn clear_arguments(&mut self) -> Result<&mut Self> {
        self.args_mut("clear_arguments")?.clear();
        self.auto_counter.reset();
        Ok(self)
    }

    /// Changes the first suffix used by auto-numbered arguments.
    pub fn set_auto_seed(&mut self, seed: u32) -> &mut Self {
        self.auto_counter = AutoCounter::with_seed(seed);
        self
    }

    /// Creates the analytics on first use; later calls merge into it.
    pub fn add_analytics(&mut self, options: Option<Map<String, Value>>) -> &mut Self {
        match self.analytics.as_mut() {
            Some(analytics) => analytics.update(options),
            None => self.analytics = Some(Analytics::new(options)),
        }
        self
    }

    pub fn clear_analytics(&mut self) -> &mut Self {
        self.analytics = None;
        self
    }

    #[must_use]
    pub fn analytics(&self) -> Option<&Analytics> {
        self.analytics.as_ref()
    }

    /// Declares the dialect of a payload nested in this call's response.
    /// Without this, WHM passthrough calls asking for API version 3 are
    /// detected from their arguments.
    pub fn set_nested_dialect(&mut self, dialect: Option<DialectId>) -> &mut Self {
        self.nested_dialect = dialect;
        self
    }

    // ── Paging, sorting, filtering ──────────────────────────────────────

    /// Requests page `start_page` (1-based). A page size of `-1` ("all",
    /// given here or remembered from earlier) leaves paging untouched.
    pub fn add_paging(&mut self, start_page: u64, page_size: Option<i64>) -> &mut Self {
        let current = self.meta.paginate.as_ref().and_then(|p| p.page_size);
        if page_size == Some(PAGE_SIZE_ALL) || current == Some(PAGE_SIZE_ALL) {
            return self;
        }
        let size = [page_size, current, Some(self.defaults.default_page_size)]
            .into_iter()
            .flatten()
            .find(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let size_u = size.unsigned_abs();

        self.meta.paginate = Some(Paginate {
            enabled: true,
            start_page: Some(start_page),
            start_record: Some(start_page.saturating_sub(1).saturating_mul(size_u).saturating_add(1)),
            page_size: Some(size),
        });
        self
    }

    pub fn clear_paging(&mut self) -> &mut Self {
        self.meta.paginate = match self.dialect {
            DialectId::WhmV1 => Some(Paginate::disabled(self.defaults.default_page_size)),
            DialectId::Uapi | DialectId::Api2 => None,
        };
        self
    }

    /// Appends a sort rule. WHM v1 accepts an empty field name; the cPanel
    /// dialects ignore one.
    pub fn add_sorting(&mut self, field: &str, direction: SortDirection, method: Option<&str>) -> &mut Self {
        if field.is_empty() && self.dialect != DialectId::WhmV1 {
            return self;
        }
        let field = match direction {
            SortDirection::Ascending => field.to_string(),
            SortDirection::Descending => format!("!{field}"),
        };
        let rule = match method.filter(|m| !m.is_empty()) {
            Some(method) => SortRule::WithMethod(field, method.to_string()),
            None => SortRule::Field(field),
        };
        self.meta.sort.push(rule);
        self
    }

    pub fn clear_sorting(&mut self) -> &mut Self {
        self.meta.sort.clear();
        self
    }

    /// Appends a `[field, operator, value]` filter; a missing operator uses
    /// the configured default.
    pub fn add_filter(&mut self, field: &str, operator: Option<&str>, value: impl Into<Value>) -> &mut Self {
        let operator = operator
            .filter(|op| !op.is_empty())
            .unwrap_or(&self.defaults.default_filter_operator)
            .to_string();
        self.add_filter_rule(FilterRule(field.to_string(), operator, value.into()))
    }

    pub fn add_filter_rule(&mut self, rule: FilterRule) -> &mut Self {
        self.meta.filter.push(rule);
        self
    }

    pub fn clear_filter(&mut self) -> &mut Self {
        self.meta.filter.clear();
        self
    }

    // ── Export ──────────────────────────────────────────────────────────

    /// Packages the collected state into a [`CallDescriptor`].
    pub fn get_run_arguments(&self) -> Result<CallDescriptor> {
        let args = match &self.args {
            Value::Object(args) => args.clone(),
            _ => {
                return Err(Error::ArgsNotMapping {
                    method: "get_run_arguments",
                });
            },
        };
        let nested_dialect = self.nested_dialect.or_else(|| self.detect_nested_dialect(&args));
        trace!(func = %self.func, dialect = %self.dialect, ?nested_dialect, "run arguments built");

        Ok(CallDescriptor {
            version: self.version(),
            module: self.module.clone(),
            func: self.func.clone(),
            args,
            meta: self.meta.clone(),
            analytics: self.analytics.clone(),
            json: self.json,
            nested_dialect,
            batch: None,
        })
    }

    fn detect_nested_dialect(&self, args: &Map<String, Value>) -> Option<DialectId> {
        if self.dialect != DialectId::WhmV1 || self.func != PASSTHROUGH_FUNC {
            return None;
        }
        let version = args.get(PASSTHROUGH_VERSION_ARG).and_then(coerce::parse_int)?;
        u32::try_from(version)
            .ok()
            .and_then(DialectId::from_version)
            .filter(|d| *d == DialectId::Uapi)
    }

    fn args_mut(&mut self, method: &'static str) -> Result<&mut Map<String, Value>> {
        self.args
            .as_object_mut()
            .ok_or(Error::ArgsNotMapping { method })
    }
}

/// Meta a freshly initialized builder starts with.
fn empty_meta(defaults: &RequestConfig) -> RequestMeta {
    RequestMeta {
        paginate: Some(Paginate::disabled(defaults.default_page_size)),
        ..RequestMeta::default()
    }
}
