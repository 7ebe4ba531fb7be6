//! C type construction, comparison, and layout.

use crate::arena::Symbol;
use crate::parse::{NodeId, ObjId};
use crate::util::align_to;
use crate::Target;

/// Index of a [`Type`] in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    LDouble,
    Enum,
    Ptr,
    Func,
    Array,
    Vla,
    Struct,
    Union,
}

/// A struct or union member.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: Option<Symbol>,
    pub ty: TypeId,
    pub idx: usize,
    pub align: i32,
    pub offset: i32,
    pub is_bitfield: bool,
    pub bit_offset: i32,
    pub bit_width: i32,
}

/// A C type.
///
/// Pointer-to and array-of types share the `base` field; code that
/// needs "a pointer is expected here" checks `base`, not `kind`, which
/// is how arrays decay naturally.
#[derive(Debug, Clone)]
pub struct Type {
    pub kind: TypeKind,
    /// sizeof() value; -1 while incomplete.
    pub size: i32,
    pub align: i32,
    pub is_unsigned: bool,
    pub is_atomic: bool,
    /// For type compatibility checks through typedefs and qualifiers.
    pub origin: Option<TypeId>,

    pub base: Option<TypeId>,
    /// Array length; -1 for incomplete/flexible arrays.
    pub array_len: i32,
    /// Element-count expression of a VLA.
    pub vla_len: Option<NodeId>,
    /// Local holding the computed byte size of a VLA.
    pub vla_size: Option<ObjId>,

    pub members: Vec<Member>,
    pub is_flexible: bool,
    pub is_packed: bool,
    /// Struct tag or enum tag, for reflection naming.
    pub tag: Option<Symbol>,
    /// Function-name prefix applied by the `x..f()` method-call sugar.
    pub methodcall_prefix: Option<Symbol>,

    pub return_ty: Option<TypeId>,
    pub params: Vec<TypeId>,
    pub is_variadic: bool,
}

impl Type {
    fn scalar(kind: TypeKind, size: i32, align: i32) -> Type {
        Type {
            kind,
            size,
            align,
            is_unsigned: false,
            is_atomic: false,
            origin: None,
            base: None,
            array_len: 0,
            vla_len: None,
            vla_size: None,
            members: Vec::new(),
            is_flexible: false,
            is_packed: false,
            tag: None,
            methodcall_prefix: None,
            return_ty: None,
            params: Vec::new(),
            is_variadic: false,
        }
    }
}

/// Per-unit type arena with the built-in types preconstructed.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<Type>,
    pub target: Target,
}

impl TypeTable {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const SHORT: TypeId = TypeId(3);
    pub const INT: TypeId = TypeId(4);
    pub const LONG: TypeId = TypeId(5);
    pub const LLONG: TypeId = TypeId(6);
    pub const UCHAR: TypeId = TypeId(7);
    pub const USHORT: TypeId = TypeId(8);
    pub const UINT: TypeId = TypeId(9);
    pub const ULONG: TypeId = TypeId(10);
    pub const ULLONG: TypeId = TypeId(11);
    pub const FLOAT: TypeId = TypeId(12);
    pub const DOUBLE: TypeId = TypeId(13);
    pub const LDOUBLE: TypeId = TypeId(14);

    pub fn new(target: Target) -> TypeTable {
        let long_size = if target.is_win() { 4 } else { 8 };
        let mut types = vec![
            Type::scalar(TypeKind::Void, 1, 1),
            Type::scalar(TypeKind::Bool, 1, 1),
            Type::scalar(TypeKind::Char, 1, 1),
            Type::scalar(TypeKind::Short, 2, 2),
            Type::scalar(TypeKind::Int, 4, 4),
            Type::scalar(TypeKind::Long, long_size, long_size),
            Type::scalar(TypeKind::Long, 8, 8),
        ];
        for id in [2usize, 3, 4, 5, 6] {
            let mut t = types[id].clone();
            t.is_unsigned = true;
            types.push(t);
        }
        types.push(Type::scalar(TypeKind::Float, 4, 4));
        types.push(Type::scalar(TypeKind::Double, 8, 8));
        // long double is an alias for double on Win64; x87 80-bit on SysV.
        if target.is_win() {
            types.push(Type::scalar(TypeKind::Double, 8, 8));
        } else {
            types.push(Type::scalar(TypeKind::LDouble, 16, 16));
        }
        TypeTable { types, target }
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// The type of `wchar_t` literals for the current target.
    pub fn wchar(&self) -> TypeId {
        if self.target.is_win() {
            TypeTable::USHORT
        } else {
            TypeTable::INT
        }
    }

    /// The unsigned integer type pointers convert to.
    pub fn uintptr(&self) -> TypeId {
        TypeTable::ULLONG
    }

    /// Shallow structural copy preserving `origin` for compatibility
    /// tracking.
    pub fn copy_type(&mut self, id: TypeId) -> TypeId {
        let mut t = self.get(id).clone();
        t.origin = Some(id);
        self.push(t)
    }

    pub fn pointer_to(&mut self, base: TypeId) -> TypeId {
        let mut t = Type::scalar(TypeKind::Ptr, 8, 8);
        t.base = Some(base);
        t.is_unsigned = true;
        self.push(t)
    }

    pub fn array_of(&mut self, base: TypeId, len: i32) -> TypeId {
        let b = self.get(base);
        let size = if len < 0 { -1 } else { b.size * len };
        let mut t = Type::scalar(TypeKind::Array, size, b.align);
        t.base = Some(base);
        t.array_len = len;
        self.push(t)
    }

    pub fn vla_of(&mut self, base: TypeId, len: NodeId) -> TypeId {
        let align = self.get(base).align;
        let mut t = Type::scalar(TypeKind::Vla, 8, align);
        t.base = Some(base);
        t.vla_len = Some(len);
        self.push(t)
    }

    pub fn func_type(&mut self, return_ty: TypeId) -> TypeId {
        // The C spec disallows sizeof(function), but GCC allows it with
        // the result 1, which makes pointer arithmetic on function
        // pointers work.
        let mut t = Type::scalar(TypeKind::Func, 1, 1);
        t.return_ty = Some(return_ty);
        self.push(t)
    }

    pub fn enum_type(&mut self) -> TypeId {
        self.push(Type::scalar(TypeKind::Enum, 4, 4))
    }

    pub fn struct_type(&mut self) -> TypeId {
        let mut t = Type::scalar(TypeKind::Struct, -1, 1);
        t.base = None;
        self.push(t)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(
            self.get(id).kind,
            TypeKind::Bool
                | TypeKind::Char
                | TypeKind::Short
                | TypeKind::Int
                | TypeKind::Long
                | TypeKind::Enum
        )
    }

    pub fn is_flonum(&self, id: TypeId) -> bool {
        matches!(
            self.get(id).kind,
            TypeKind::Float | TypeKind::Double | TypeKind::LDouble
        )
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.is_integer(id) || self.is_flonum(id)
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        self.get(id).kind == TypeKind::Void
    }

    pub fn has_base(&self, id: TypeId) -> bool {
        self.get(id).base.is_some() && self.get(id).kind != TypeKind::Func
    }

    /// C11 type compatibility by structure.
    pub fn is_compatible(&self, t1: TypeId, t2: TypeId) -> bool {
        if t1 == t2 {
            return true;
        }
        let a = self.get(t1);
        let b = self.get(t2);
        if let Some(origin) = a.origin {
            return self.is_compatible(origin, t2);
        }
        if let Some(origin) = b.origin {
            return self.is_compatible(t1, origin);
        }
        if a.kind != b.kind {
            return false;
        }
        match a.kind {
            TypeKind::Char | TypeKind::Short | TypeKind::Int | TypeKind::Long => {
                a.is_unsigned == b.is_unsigned && a.size == b.size
            }
            TypeKind::Float | TypeKind::Double | TypeKind::LDouble => true,
            TypeKind::Ptr => self.is_compatible(a.base.unwrap(), b.base.unwrap()),
            TypeKind::Func => {
                if !self.is_compatible(a.return_ty.unwrap(), b.return_ty.unwrap()) {
                    return false;
                }
                if a.is_variadic != b.is_variadic || a.params.len() != b.params.len() {
                    return false;
                }
                a.params
                    .iter()
                    .zip(&b.params)
                    .all(|(&p1, &p2)| self.is_compatible(p1, p2))
            }
            TypeKind::Array => {
                if !self.is_compatible(a.base.unwrap(), b.base.unwrap()) {
                    return false;
                }
                a.array_len < 0 || b.array_len < 0 || a.array_len == b.array_len
            }
            _ => false,
        }
    }

    /// Lay out struct or union members in place and return the
    /// resulting `(size, align, is_flexible)`.
    ///
    /// Bitfields pack into storage units of their declared type; a
    /// zero-width member forces alignment to the next unit, and a
    /// member that would straddle a unit boundary starts a new one.
    pub fn layout_members(
        &mut self,
        members: &mut [Member],
        is_union: bool,
        is_packed: bool,
    ) -> (i32, i32, bool) {
        let mut align = 1i32;
        let mut is_flexible = false;

        if is_union {
            let mut size = 0i32;
            for m in members.iter_mut() {
                m.offset = 0;
                m.bit_offset = 0;
                if !is_packed {
                    align = align.max(m.align);
                }
                size = size.max(self.get(m.ty).size.max(0));
            }
            return (align_to(size as i64, align as i64) as i32, align, false);
        }

        let mut bits = 0i64;
        let n = members.len();
        for (i, m) in members.iter_mut().enumerate() {
            let m_size = self.get(m.ty).size;

            if m.is_bitfield && m.bit_width == 0 {
                // Zero-width bitfields break to the next storage unit.
                bits = align_to(bits, m_size as i64 * 8);
            } else if m.is_bitfield {
                let unit = m_size as i64 * 8;
                if bits / unit != (bits + m.bit_width as i64 - 1) / unit {
                    bits = align_to(bits, unit);
                }
                m.offset = (bits / 8 / m_size as i64 * m_size as i64) as i32;
                m.bit_offset = (bits - m.offset as i64 * 8) as i32;
                bits += m.bit_width as i64;
            } else if m_size < 0 && i == n - 1 {
                // Flexible array member: contributes nothing to sizeof.
                m.offset = (align_to(bits, m.align as i64 * 8) / 8) as i32;
                is_flexible = true;
            } else {
                if !is_packed {
                    bits = align_to(bits, m.align as i64 * 8);
                }
                m.offset = (bits / 8) as i32;
                bits += m_size as i64 * 8;
            }

            if !is_packed {
                align = align.max(m.align);
            }
        }

        let size = (align_to(bits, align as i64 * 8) / 8) as i32;
        (size, align, is_flexible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tt: &TypeTable, ty: TypeId, idx: usize) -> Member {
        Member {
            name: None,
            ty,
            idx,
            align: tt.get(ty).align,
            offset: 0,
            is_bitfield: false,
            bit_offset: 0,
            bit_width: 0,
        }
    }

    #[test]
    fn scalar_sizes_per_target() {
        let sysv = TypeTable::new(Target::SysV);
        assert_eq!(sysv.get(TypeTable::LONG).size, 8);
        assert_eq!(sysv.get(TypeTable::LDOUBLE).size, 16);

        let win = TypeTable::new(Target::Win64);
        assert_eq!(win.get(TypeTable::LONG).size, 4);
        assert_eq!(win.get(TypeTable::LLONG).size, 8);
        assert_eq!(win.get(TypeTable::LDOUBLE).size, 8);
        assert_eq!(win.get(TypeTable::LDOUBLE).kind, TypeKind::Double);
    }

    #[test]
    fn struct_layout() {
        let mut tt = TypeTable::new(Target::SysV);
        // struct { char c; int i; char d; }
        let mut members = vec![
            member(&tt, TypeTable::CHAR, 0),
            member(&tt, TypeTable::INT, 1),
            member(&tt, TypeTable::CHAR, 2),
        ];
        let (size, align, _) = tt.layout_members(&mut members, false, false);
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 4);
        assert_eq!(members[2].offset, 8);
        assert_eq!((size, align), (12, 4));
        assert_eq!(size % align, 0);
    }

    #[test]
    fn packed_layout() {
        let mut tt = TypeTable::new(Target::SysV);
        let mut members = vec![
            member(&tt, TypeTable::CHAR, 0),
            member(&tt, TypeTable::INT, 1),
        ];
        let (size, align, _) = tt.layout_members(&mut members, false, true);
        assert_eq!(members[1].offset, 1);
        assert_eq!((size, align), (5, 1));
    }

    #[test]
    fn union_layout() {
        let mut tt = TypeTable::new(Target::SysV);
        let mut members = vec![
            member(&tt, TypeTable::CHAR, 0),
            member(&tt, TypeTable::DOUBLE, 1),
        ];
        let (size, align, _) = tt.layout_members(&mut members, true, false);
        assert_eq!(members[0].offset, 0);
        assert_eq!(members[1].offset, 0);
        assert_eq!((size, align), (8, 8));
    }

    #[test]
    fn bitfield_layout() {
        let mut tt = TypeTable::new(Target::SysV);
        // struct { int a : 3; int b : 5; int c : 30; }
        let mut members = vec![
            member(&tt, TypeTable::INT, 0),
            member(&tt, TypeTable::INT, 1),
            member(&tt, TypeTable::INT, 2),
        ];
        for (i, w) in [3, 5, 30].iter().enumerate() {
            members[i].is_bitfield = true;
            members[i].bit_width = *w;
        }
        let (size, _, _) = tt.layout_members(&mut members, false, false);
        assert_eq!((members[0].offset, members[0].bit_offset), (0, 0));
        assert_eq!((members[1].offset, members[1].bit_offset), (0, 3));
        // c cannot straddle the unit boundary, so it starts a new unit.
        assert_eq!((members[2].offset, members[2].bit_offset), (4, 0));
        assert_eq!(size, 8);
    }

    #[test]
    fn zero_width_bitfield_breaks_unit() {
        let mut tt = TypeTable::new(Target::SysV);
        let mut members = vec![
            member(&tt, TypeTable::INT, 0),
            member(&tt, TypeTable::INT, 1),
            member(&tt, TypeTable::INT, 2),
        ];
        members[0].is_bitfield = true;
        members[0].bit_width = 3;
        members[1].is_bitfield = true;
        members[1].bit_width = 0;
        members[2].is_bitfield = true;
        members[2].bit_width = 3;
        let (size, _, _) = tt.layout_members(&mut members, false, false);
        assert_eq!((members[2].offset, members[2].bit_offset), (4, 0));
        assert_eq!(size, 8);
    }

    #[test]
    fn compatibility() {
        let mut tt = TypeTable::new(Target::SysV);
        assert!(tt.is_compatible(TypeTable::INT, TypeTable::INT));
        assert!(!tt.is_compatible(TypeTable::INT, TypeTable::UINT));
        assert!(!tt.is_compatible(TypeTable::INT, TypeTable::LONG));

        let p1 = tt.pointer_to(TypeTable::INT);
        let p2 = tt.pointer_to(TypeTable::INT);
        let p3 = tt.pointer_to(TypeTable::CHAR);
        assert!(tt.is_compatible(p1, p2));
        assert!(!tt.is_compatible(p1, p3));

        // Symmetry through origin links.
        let copy = tt.copy_type(TypeTable::INT);
        assert!(tt.is_compatible(copy, TypeTable::INT));
        assert!(tt.is_compatible(TypeTable::INT, copy));

        let a1 = tt.array_of(TypeTable::INT, 4);
        let a2 = tt.array_of(TypeTable::INT, 4);
        let a3 = tt.array_of(TypeTable::INT, 5);
        let a4 = tt.array_of(TypeTable::INT, -1);
        assert!(tt.is_compatible(a1, a2));
        assert!(!tt.is_compatible(a1, a3));
        assert!(tt.is_compatible(a1, a4));
    }
}
