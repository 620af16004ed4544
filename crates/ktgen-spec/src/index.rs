//! Tensor index symbols and the extents each one is tested with.

use crate::extent::Extent;

/// One index symbol of a test specification, with defaults already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub symbol: char,
    pub static_extent: u32,
    pub allow_dynamic: bool,
    /// Whether this index opens a loop in the verification nest.
    pub forms_loop: bool,
}

impl IndexSpec {
    pub fn new(symbol: char, static_extent: u32) -> Self {
        Self {
            symbol,
            static_extent,
            allow_dynamic: true,
            forms_loop: true,
        }
    }

    pub fn static_only(mut self) -> Self {
        self.allow_dynamic = false;
        self
    }

    pub fn without_loop(mut self) -> Self {
        self.forms_loop = false;
        self
    }

    /// Extents every variant picks from, static first. Never empty.
    pub fn extents_to_test(&self) -> Vec<Extent> {
        let mut extents = vec![Extent::Static(self.static_extent)];
        if self.allow_dynamic {
            extents.push(Extent::Dynamic);
        }
        extents
    }

    /// `Index<'i'> i;`
    pub fn declaration(&self) -> String {
        format!("Index<'{0}'> {0};", self.symbol)
    }

    /// Name of the runtime variable holding this index's extent.
    pub fn extent_var(&self) -> String {
        format!("ext_{}", self.symbol)
    }

    /// Loop variable of the scalar reference computation: `ii` for `i`.
    pub fn loop_var(&self) -> String {
        format!("{0}{0}", self.symbol)
    }

    pub fn loop_open(&self) -> String {
        let var = self.loop_var();
        format!("for(int {var}=0; {var}<{}; ++{var}){{", self.extent_var())
    }

    /// Declaration of `ext_<symbol>`. Dynamic extents are read from
    /// `argv[argv_slot]`.
    pub fn extent_declaration(&self, extent: Extent, argv_slot: usize) -> String {
        match extent {
            Extent::Static(n) => format!("constexpr int {} = {n};", self.extent_var()),
            Extent::Dynamic => format!(
                "int const {} = std::atoi(argv[{argv_slot}]);",
                self.extent_var()
            ),
        }
    }
}
