//! Infer - light type argument inference for generic methods
//!
//! Corresponds to a small subset of JavaC's `com.sun.tools.javac.comp.Infer`.
//! Method type variables are replaced by inference variables
//! ([`Type::Undet`]) while an invocation is checked. Argument types
//! contribute lower bounds; a solved variable is the least upper bound of
//! its bounds. When nothing constrains a variable, the assignment target
//! (if any) is used, and failing that the variable's declared bound.

use crate::common::symbol::SymbolId;
use crate::common::types::{MethodType, PartialType, Type, Types};

/// Lower bounds gathered for inference variables, in discovery order
pub type Bounds = Vec<(SymbolId, Type)>;

/// Replace `vars` by inference variables throughout `mt`
pub fn instantiate(types: &Types, mt: &MethodType, vars: &[SymbolId]) -> MethodType {
    let undets: Vec<Type> = vars.iter().map(|v| Type::Undet(*v)).collect();
    types.subst_method(mt, vars, &undets)
}

/// Record what `actual` tells about the inference variables in `formal`
pub fn collect_bounds(types: &Types, actual: &Type, formal: &Type, bounds: &mut Bounds) {
    match formal {
        Type::Undet(v) => {
            if !matches!(actual, Type::Null | Type::Undet(_)) && !types.is_erroneous(actual) && !actual.is_void() {
                push_bound(bounds, *v, types.boxed_type_or_type(actual));
            }
        }
        Type::Array(felem) => {
            if let Type::Array(aelem) = actual {
                collect_bounds(types, aelem, felem, bounds);
            }
        }
        Type::Class(fct) if formal.has_undet() => {
            let boxed = types.boxed_type_or_type(actual);
            if let Some(Type::Class(sup)) = types.as_super(&boxed, fct.sym) {
                for (a, f) in sup.args.iter().zip(&fct.args) {
                    match f {
                        Type::Wildcard(w) => {
                            if let Some(bound) = &w.bound {
                                collect_bounds(types, &types.upper_bound(a), bound, bounds);
                            }
                        }
                        _ => collect_bounds(types, a, f, bounds),
                    }
                }
            }
        }
        _ => {}
    }
}

fn push_bound(bounds: &mut Bounds, var: SymbolId, bound: Type) {
    if !bounds.iter().any(|(v, b)| *v == var && *b == bound) {
        bounds.push((var, bound));
    }
}

/// Solve each variable from its bounds; `None` when unconstrained
pub fn solve(types: &Types, vars: &[SymbolId], bounds: &Bounds) -> Vec<Option<Type>> {
    vars.iter()
        .map(|v| {
            bounds
                .iter()
                .filter(|(var, _)| var == v)
                .map(|(_, b)| b.clone())
                .reduce(|acc, b| types.lub(&acc, &b))
        })
        .collect()
}

/// Substitute solved variables into `t`; unsolved ones stay inference
/// variables
pub fn apply(types: &Types, t: &Type, vars: &[SymbolId], solution: &[Option<Type>]) -> Type {
    let (from, to): (Vec<SymbolId>, Vec<Type>) = vars
        .iter()
        .zip(solution)
        .filter_map(|(v, s)| s.clone().map(|s| (*v, s)))
        .unzip();
    subst_undet(types, t, &from, &to)
}

/// Like [`Types::subst`] but for inference variables
pub fn subst_undet(types: &Types, t: &Type, from: &[SymbolId], to: &[Type]) -> Type {
    match t {
        Type::Undet(v) => match from.iter().position(|f| f == v) {
            Some(i) => to[i].clone(),
            None => t.clone(),
        },
        Type::Class(ct) => Type::generic(ct.sym, ct.args.iter().map(|a| subst_undet(types, a, from, to)).collect()),
        Type::Array(elem) => Type::array_of(subst_undet(types, elem, from, to)),
        Type::Wildcard(w) => {
            let mut w = w.clone();
            w.bound = w.bound.map(|b| Box::new(subst_undet(types, &b, from, to)));
            Type::Wildcard(w)
        }
        Type::Method(mt) => Type::Method(MethodType {
            params: mt.params.iter().map(|p| subst_undet(types, p, from, to)).collect(),
            ret: Box::new(subst_undet(types, &mt.ret, from, to)),
            thrown: mt.thrown.clone(),
            tvars: mt.tvars.clone(),
        }),
        other => other.clone(),
    }
}

/// Bounds implied by assigning `ret` to `target`
pub fn collect_target_bounds(types: &Types, ret: &Type, target: &Type, bounds: &mut Bounds) {
    match (ret, target) {
        (Type::Undet(v), _) if !target.is_none() && !types.is_erroneous(target) => {
            push_bound(bounds, *v, types.boxed_type_or_type(target));
        }
        (Type::Class(rct), Type::Class(tct)) if rct.sym == tct.sym => {
            for (r, t) in rct.args.iter().zip(&tct.args) {
                let t = match t {
                    Type::Wildcard(_) => types.upper_bound(t),
                    other => other.clone(),
                };
                collect_target_bounds(types, r, &t, bounds);
            }
        }
        (Type::Class(_), Type::Class(tct)) => {
            if !ret.has_undet() {
                return;
            }
            // List<E> returned into Iterable<String>: map through the supertype
            if let Some(sup @ Type::Class(_)) = types.as_super(ret, tct.sym) {
                collect_target_bounds(types, &sup, target, bounds);
            }
        }
        (Type::Array(r), Type::Array(t)) => collect_target_bounds(types, r, t, bounds),
        _ => {}
    }
}

/// Fallback for variables nothing constrains: their declared bound
pub fn default_solution(types: &Types, vars: &[SymbolId], solution: &mut [Option<Type>]) {
    for (v, s) in vars.iter().zip(solution.iter_mut()) {
        if s.is_none() {
            *s = Some(types.erasure(&types.upper_bound(&Type::TypeVar(*v))));
        }
    }
}

/// Finish a partially inferred invocation against `target`.
///
/// Returns the instantiated return type, or `None` if it is not
/// compatible with the target. Inference variables of an enclosing
/// invocation (still [`Type::Undet`] in `target`) receive the result as a
/// bound through `outer`.
pub fn complete_partial(
    types: &Types,
    partial: &PartialType,
    target: &Type,
    loose: bool,
    outer: &mut Bounds,
) -> Option<Type> {
    let mut bounds = partial.bounds.clone();
    if !target.has_undet() {
        collect_target_bounds(types, &partial.mtype.ret, target, &mut bounds);
    }
    let mut solution = solve(types, &partial.vars, &bounds);
    default_solution(types, &partial.vars, &mut solution);
    let ret = apply(types, &partial.mtype.ret, &partial.vars, &solution);
    if target.has_undet() {
        collect_bounds(types, &ret, target, outer);
        return Some(ret);
    }
    if target.is_none() || types.is_convertible(&ret, target, loose) {
        Some(ret)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::symtab::Symtab;
    use crate::common::types::TypeTag;

    #[test]
    fn argument_bounds_are_lubbed() {
        let mut symtab = Symtab::new();
        let owner = symtab.predef.objects;
        let t = symtab.new_type_var(owner, "T", Vec::new());
        let types = Types::new(&symtab);
        let mut bounds = Bounds::new();
        collect_bounds(&types, &Type::Prim(TypeTag::Int), &Type::Undet(t), &mut bounds);
        collect_bounds(&types, &types.boxed_type(TypeTag::Long), &Type::Undet(t), &mut bounds);
        let solution = solve(&types, &[t], &bounds);
        assert_eq!(solution[0], Some(Type::class(symtab.predef.number)));
    }

    #[test]
    fn target_fills_unconstrained_variables() {
        let mut symtab = Symtab::new();
        let list = symtab.predef.list;
        let e = symtab.new_type_var(list, "E", Vec::new());
        let types = Types::new(&symtab);
        let partial = PartialType {
            method: list,
            mtype: MethodType::new(Vec::new(), Type::generic(list, vec![Type::Undet(e)])),
            vars: vec![e],
            bounds: Vec::new(),
        };
        let target = Type::generic(list, vec![types.string_type()]);
        let mut outer = Bounds::new();
        let ret = complete_partial(&types, &partial, &target, true, &mut outer);
        assert_eq!(ret, Some(target));

        let object_list = complete_partial(&types, &partial, &Type::None, true, &mut outer);
        assert_eq!(object_list, Some(Type::generic(list, vec![types.object_type()])));
    }

    #[test]
    fn parameterized_formals_match_through_supertypes() {
        let mut symtab = Symtab::new();
        let owner = symtab.predef.objects;
        let t = symtab.new_type_var(owner, "T", Vec::new());
        let types = Types::new(&symtab);
        let iterable_t = Type::generic(symtab.predef.iterable, vec![Type::Undet(t)]);
        let list_string = Type::generic(symtab.predef.list, vec![types.string_type()]);
        let mut bounds = Bounds::new();
        collect_bounds(&types, &list_string, &iterable_t, &mut bounds);
        assert_eq!(bounds, vec![(t, types.string_type())]);
    }
}
