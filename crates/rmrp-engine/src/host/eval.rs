use std::collections::HashMap;

use glam::Vec3;

use rmrp_compiler::host::{AssignOp, BinOp, Expr, Place, Section, Stmt, TypeName};
use rmrp_compiler::templates::NORMAL_EPSILON;

use super::prelude;
use super::value::Value;
use super::HostScene;
use crate::trace::estimate_normal;

type EvalResult<T> = Result<T, String>;

struct Local {
    ty: TypeName,
    value: Value,
}

// ── Evaluator ─────────────────────────────────────────────────────────────

/// Runs one section of a [`HostScene`] for one sample.
pub(super) struct Evaluator<'a> {
    scene: &'a HostScene,
    section: Section,
    locals: HashMap<String, Local>,
}

impl<'a> Evaluator<'a> {
    /// `position` is ignored by the skybox, which only sees `step`.
    pub fn new(scene: &'a HostScene, section: Section, position: Vec3, step: u32) -> Self {
        let mut locals = HashMap::new();
        locals.insert(
            "step".to_string(),
            Local { ty: TypeName::INT, value: Value::scalar(step as f32) },
        );
        if section != Section::Skybox {
            locals.insert(
                "position".to_string(),
                Local { ty: TypeName::FLOAT3, value: Value::vec3(position) },
            );
        }
        Self { scene, section, locals }
    }

    /// Executes the section and returns its result local.
    pub fn run(mut self) -> EvalResult<Value> {
        let scene = self.scene;
        for stmt in scene.program.section(self.section) {
            self.exec(stmt)?;
        }
        let name = self.section.result();
        let local = self
            .locals
            .get(name)
            .ok_or_else(|| format!("`{name}` is never declared"))?;
        local.value.resize(self.section.result_width())
    }

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::Declare { ty, name, init } => {
                if self.locals.contains_key(name) {
                    return Err(format!("`{name}` is already declared"));
                }
                let value = match init {
                    Some(expr) => self.eval(expr)?.convert(*ty)?,
                    None => Value::zero(*ty),
                };
                self.locals.insert(name.clone(), Local { ty: *ty, value });
            }
            Stmt::Assign { target, op, value } => {
                let rhs = self.eval(value)?;
                self.assign(target, *op, rhs)?;
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn local(&self, name: &str) -> EvalResult<&Local> {
        match self.locals.get(name) {
            Some(local) => Ok(local),
            None if self.scene.globals.contains_key(name) => {
                Err(format!("parameter `{name}` is read-only"))
            }
            None => Err(format!("unknown identifier `{name}`")),
        }
    }

    fn assign(&mut self, target: &Place, op: AssignOp, rhs: Value) -> EvalResult<()> {
        let local = self.local(&target.name)?;
        let (ty, current) = (local.ty, local.value);

        let selected = match &target.swizzle {
            Some(swizzle) => current.swizzle(swizzle)?,
            None => current,
        };
        let updated = match op.binary() {
            Some(bin) => binary(bin, selected, rhs),
            None => rhs,
        };
        let stored = match &target.swizzle {
            Some(swizzle) => current.write_lanes(swizzle, updated)?,
            None => updated,
        };

        let value = stored.convert(ty)?;
        if let Some(local) = self.locals.get_mut(&target.name) {
            local.value = value;
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        Ok(match expr {
            Expr::Number(x) => Value::scalar(*x),
            Expr::Var(name) => match self.locals.get(name) {
                Some(local) => local.value,
                None => *self
                    .scene
                    .globals
                    .get(name)
                    .ok_or_else(|| format!("unknown identifier `{name}`"))?,
            },
            Expr::Construct { ty, args } => self.construct(*ty, args)?,
            Expr::Swizzle { base, swizzle } => self.eval(base)?.swizzle(swizzle)?,
            Expr::Neg(inner) => self.eval(inner)?.map(|x| -x),
            Expr::Binary { op, lhs, rhs } => {
                let (a, b) = (self.eval(lhs)?, self.eval(rhs)?);
                binary(*op, a, b)
            }
            Expr::Select { cond, then, otherwise } => {
                let c = self.eval(cond)?;
                let (t, e) = (self.eval(then)?, self.eval(otherwise)?);
                c.zip3(t, e, |c, t, e| if c != 0.0 { t } else { e })
            }
            Expr::Call { name, args } => self.call(name, args)?,
        })
    }

    /// `floatN(...)`: arguments are concatenated lane by lane, or a single
    /// scalar is splatted.
    fn construct(&mut self, ty: TypeName, args: &[Expr]) -> EvalResult<Value> {
        let values = args.iter().map(|a| self.eval(a)).collect::<EvalResult<Vec<_>>>()?;
        if let [single] = values.as_slice() {
            if single.width() == 1 {
                return single.convert(ty);
            }
        }
        let mut lanes = Vec::with_capacity(4);
        for v in &values {
            lanes.extend(v.lanes().to_array().into_iter().take(v.width() as usize));
        }
        if lanes.len() != ty.width as usize {
            return Err(format!(
                "constructor for {} lanes given {} component(s)",
                ty.width,
                lanes.len()
            ));
        }
        lanes.resize(4, 0.0);
        Value::vec4(glam::Vec4::from_slice(&lanes)).resize(ty.width)?.convert(ty)
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> EvalResult<Value> {
        match name {
            "smoothUnion_m" => return self.smooth_union_m(args),
            "calculate_normal" => {
                if self.section != Section::Material {
                    return Err("calculate_normal is only available in material code".into());
                }
                let [p] = self.eval_args::<1>(name, args)?;
                let p = p.resize(3)?.xyz();
                return Ok(Value::vec3(estimate_normal(self.scene, p, NORMAL_EPSILON)));
            }
            _ => {}
        }
        let values = args.iter().map(|a| self.eval(a)).collect::<EvalResult<Vec<_>>>()?;
        builtin(name, &values)
    }

    fn eval_args<const N: usize>(&mut self, name: &str, args: &[Expr]) -> EvalResult<[Value; N]> {
        if args.len() != N {
            return Err(format!("{name} takes {N} argument(s), got {}", args.len()));
        }
        let mut out = [Value::scalar(0.0); N];
        for (slot, arg) in out.iter_mut().zip(args) {
            *slot = self.eval(arg)?;
        }
        Ok(out)
    }

    /// The blended colour is written back to the local named by the third
    /// argument.
    fn smooth_union_m(&mut self, args: &[Expr]) -> EvalResult<Value> {
        let [a, b, color_a, color_b, blend] = self.eval_args::<5>("smoothUnion_m", args)?;
        let Expr::Var(target) = &args[2] else {
            return Err("smoothUnion_m writes its third argument, which must be a local".into());
        };
        let mut color = color_a.resize(4)?.lanes();
        let d = prelude::smooth_union_m(
            a.resize(1)?.x(),
            b.resize(1)?.x(),
            &mut color,
            color_b.resize(4)?.lanes(),
            blend.resize(1)?.x(),
        );
        let place = Place { name: target.clone(), swizzle: None };
        self.assign(&place, AssignOp::Set, Value::vec4(color))?;
        Ok(Value::scalar(d))
    }
}

// ── Operators ─────────────────────────────────────────────────────────────

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

fn binary(op: BinOp, a: Value, b: Value) -> Value {
    match op {
        BinOp::Add => a.zip(b, |x, y| x + y),
        BinOp::Sub => a.zip(b, |x, y| x - y),
        BinOp::Mul => a.zip(b, |x, y| x * y),
        BinOp::Div => a.zip(b, |x, y| x / y),
        BinOp::Lt => a.zip(b, |x, y| flag(x < y)),
        BinOp::Le => a.zip(b, |x, y| flag(x <= y)),
        BinOp::Gt => a.zip(b, |x, y| flag(x > y)),
        BinOp::Ge => a.zip(b, |x, y| flag(x >= y)),
        BinOp::Eq => a.zip(b, |x, y| flag(x == y)),
        BinOp::Ne => a.zip(b, |x, y| flag(x != y)),
    }
}

// ── Builtins ──────────────────────────────────────────────────────────────

fn arity<const N: usize>(name: &str, args: &[Value]) -> EvalResult<[Value; N]> {
    <[Value; N]>::try_from(args)
        .map_err(|_| format!("{name} takes {N} argument(s), got {}", args.len()))
}

fn vec3_arg(v: Value) -> EvalResult<Vec3> {
    Ok(v.resize(3)?.xyz())
}

fn scalar_arg(v: Value) -> EvalResult<f32> {
    Ok(v.resize(1)?.x())
}

fn length(v: Value) -> f32 {
    v.zip(v, |x, y| x * y).sum().sqrt()
}

/// Intrinsics and helper-library functions by HLSL name.
fn builtin(name: &str, args: &[Value]) -> EvalResult<Value> {
    let unary = |f: fn(f32) -> f32| arity::<1>(name, args).map(|[a]| a.map(f));
    let binary = |f: fn(f32, f32) -> f32| arity::<2>(name, args).map(|[a, b]| a.zip(b, f));
    let ternary =
        |f: fn(f32, f32, f32) -> f32| arity::<3>(name, args).map(|[a, b, c]| a.zip3(b, c, f));

    match name {
        "abs" => unary(f32::abs),
        "floor" => unary(f32::floor),
        "ceil" => unary(f32::ceil),
        "frac" => unary(|x| x - x.floor()),
        "sqrt" => unary(f32::sqrt),
        "sin" => unary(f32::sin),
        "cos" => unary(f32::cos),
        "tan" => unary(f32::tan),
        "exp" => unary(f32::exp),
        "log" => unary(f32::ln),
        "sign" => unary(|x| if x == 0.0 { 0.0 } else { x.signum() }),
        "saturate" => unary(|x| x.clamp(0.0, 1.0)),
        "min" => binary(f32::min),
        "max" => binary(f32::max),
        "fmod" => binary(|x, y| x % y),
        "pow" => binary(f32::powf),
        "step" => binary(|edge, x| flag(x >= edge)),
        "clamp" => ternary(|x, lo, hi| x.max(lo).min(hi)),
        "lerp" => ternary(|a, b, t| a + (b - a) * t),
        "smoothstep" => ternary(|lo, hi, x| {
            let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        }),
        "length" => arity::<1>(name, args).map(|[v]| Value::scalar(length(v))),
        "dot" => arity::<2>(name, args).map(|[a, b]| Value::scalar(a.zip(b, |x, y| x * y).sum())),
        "distance" => {
            arity::<2>(name, args).map(|[a, b]| Value::scalar(length(a.zip(b, |x, y| x - y))))
        }
        "normalize" => arity::<1>(name, args).map(|[v]| {
            let len = length(v);
            v.map(|x| x / len)
        }),
        "cross" => {
            let [a, b] = arity::<2>(name, args)?;
            Ok(Value::vec3(vec3_arg(a)?.cross(vec3_arg(b)?)))
        }

        "planeSD" => {
            let [p] = arity::<1>(name, args)?;
            Ok(Value::scalar(prelude::plane_sd(vec3_arg(p)?)))
        }
        "sphereSD" => {
            let [p, r] = arity::<2>(name, args)?;
            Ok(Value::scalar(prelude::sphere_sd(vec3_arg(p)?, scalar_arg(r)?)))
        }
        "boxSD" => {
            let [p, b] = arity::<2>(name, args)?;
            Ok(Value::scalar(prelude::box_sd(vec3_arg(p)?, vec3_arg(b)?)))
        }
        "repeat" => {
            let [p, cell] = arity::<2>(name, args)?;
            Ok(Value::vec3(prelude::repeat(vec3_arg(p)?, vec3_arg(cell)?)))
        }
        "smoothUnion" => {
            let [a, b, blend] = arity::<3>(name, args)?;
            Ok(Value::scalar(prelude::smooth_union(
                scalar_arg(a)?,
                scalar_arg(b)?,
                scalar_arg(blend)?,
            )))
        }
        "transformModifier" => {
            let [p, t] = arity::<2>(name, args)?;
            Ok(Value::vec3(prelude::transform_modifier(vec3_arg(p)?, vec3_arg(t)?)))
        }
        "unlitMaterial" => {
            let [c] = arity::<1>(name, args)?;
            c.resize(4)
        }
        "litMaterial" => {
            let [n, l, c] = arity::<3>(name, args)?;
            Ok(Value::vec4(prelude::lit_material(vec3_arg(n)?, vec3_arg(l)?, c.resize(4)?.lanes())))
        }

        _ => Err(format!("unknown function `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Value {
        builtin(name, args).unwrap()
    }

    #[test]
    fn intrinsics_are_lane_wise() {
        let v = Value::vec3(Vec3::new(-1.5, 0.25, 2.0));
        assert_eq!(call("abs", &[v]), Value::vec3(Vec3::new(1.5, 0.25, 2.0)));
        assert_eq!(call("saturate", &[v]), Value::vec3(Vec3::new(0.0, 0.25, 1.0)));
        assert_eq!(call("frac", &[Value::scalar(-0.25)]), Value::scalar(0.75));
        assert_eq!(call("fmod", &[Value::scalar(-5.0), Value::scalar(3.0)]), Value::scalar(-2.0));
        assert_eq!(
            call("max", &[v, Value::scalar(0.0)]),
            Value::vec3(Vec3::new(0.0, 0.25, 2.0))
        );
        assert_eq!(call("sign", &[Value::scalar(0.0)]), Value::scalar(0.0));
    }

    #[test]
    fn geometric_intrinsics() {
        let v = Value::vec3(Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(call("length", &[v]), Value::scalar(5.0));
        assert_eq!(call("dot", &[v, v]), Value::scalar(25.0));
        assert_eq!(call("normalize", &[v]), Value::vec3(Vec3::new(0.6, 0.8, 0.0)));
        assert_eq!(
            call("cross", &[Value::vec3(Vec3::X), Value::vec3(Vec3::Y)]),
            Value::vec3(Vec3::Z)
        );
    }

    #[test]
    fn interpolation() {
        let (a, b) = (Value::scalar(2.0), Value::scalar(4.0));
        assert_eq!(call("lerp", &[a, b, Value::scalar(0.5)]), Value::scalar(3.0));
        assert_eq!(call("clamp", &[Value::scalar(9.0), a, b]), b);
        assert_eq!(call("smoothstep", &[a, b, Value::scalar(3.0)]), Value::scalar(0.5));
        assert_eq!(call("step", &[a, Value::scalar(2.0)]), Value::scalar(1.0));
    }

    #[test]
    fn helper_library_is_callable() {
        let p = Value::vec3(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(call("sphereSD", &[p, Value::scalar(1.0)]), Value::scalar(1.0));
        assert_eq!(call("planeSD", &[p]), Value::scalar(2.0));
        assert_eq!(
            call("transformModifier", &[p, Value::vec3(Vec3::Y)]),
            Value::vec3(Vec3::Y)
        );
        assert_eq!(call("unlitMaterial", &[Value::scalar(1.0)]), Value::vec4(glam::Vec4::ONE));
    }

    #[test]
    fn wrong_arity_and_unknown_names() {
        assert_eq!(
            builtin("sphereSD", &[Value::scalar(1.0)]),
            Err("sphereSD takes 2 argument(s), got 1".into())
        );
        assert_eq!(builtin("tex2D", &[]), Err("unknown function `tex2D`".into()));
    }

    #[test]
    fn narrow_vectors_do_not_widen() {
        let v2 = Value::zero(TypeName { width: 2, integer: false });
        assert!(builtin("sphereSD", &[v2, Value::scalar(1.0)]).is_err());
    }
}
