use crate::{
    declarations::{
        Declaration, EnumDeclaration, Enumerant, InterfaceDeclaration, Member, MemberShape,
    },
    options::GeneratorOptions,
    schema::{Comments, SchemaFile},
    string_builder::StringBuilder,
};

pub const HEADER: &str = "// Code generated by protoc-gen-tstypes. DO NOT EDIT.";

/// `routeguide/route_guide.proto` in package `routeguide` becomes
/// `routeguide/routeguide.route_guide.d.ts`.
pub fn output_file_name(file: &SchemaFile) -> String {
    let (directory, base) = match file.name.rsplit_once('/') {
        Some((directory, base)) => (Some(directory), base),
        None => (None, file.name.as_str()),
    };

    let stem = base.strip_suffix(".proto").unwrap_or(base);

    let file_name = if file.package.is_empty() {
        format!("{stem}.d.ts")
    } else {
        format!("{}.{stem}.d.ts", file.package)
    };

    match directory {
        Some(directory) => format!("{directory}/{file_name}"),
        None => file_name,
    }
}

pub fn emit_file(
    file: &SchemaFile,
    declarations: &[Declaration],
    options: &GeneratorOptions,
) -> String {
    let scope = file.package_segments();

    let mut contents = StringBuilder::new();
    contents.push(HEADER);
    contents.blank();

    if scope.is_empty() {
        for (index, declaration) in declarations.iter().enumerate() {
            if index > 0 {
                contents.blank();
            }

            emit_declaration(&mut contents, declaration, "declare", &scope, options);
        }
    } else {
        contents.push(format!("declare namespace {} {{", file.package));
        contents.indent();

        for declaration in declarations {
            contents.blank();
            emit_declaration(&mut contents, declaration, "export", &scope, options);
        }

        contents.dedent();
        contents.push("}");
    }

    contents.build()
}

fn emit_declaration(
    contents: &mut StringBuilder,
    declaration: &Declaration,
    keyword: &str,
    scope: &[String],
    options: &GeneratorOptions,
) {
    tracing::trace!(name = declaration.name(), "emitting declaration");

    match declaration {
        Declaration::Enum(declaration) => emit_enum(contents, declaration, keyword),
        Declaration::Interface(declaration) => {
            emit_interface(contents, declaration, keyword, scope, options)
        }
    }
}

fn emit_enum(contents: &mut StringBuilder, declaration: &EnumDeclaration, keyword: &str) {
    push_leading(contents, &declaration.comments);
    contents.push(format!("{keyword} enum {} {{", declaration.name));
    contents.indent();

    for Enumerant { name, comments } in &declaration.values {
        push_leading(contents, comments);
        contents.push(with_trailing(format!("{name} = \"{name}\","), comments));
    }

    contents.dedent();
    contents.push("}");
}

fn emit_interface(
    contents: &mut StringBuilder,
    declaration: &InterfaceDeclaration,
    keyword: &str,
    scope: &[String],
    options: &GeneratorOptions,
) {
    push_leading(contents, &declaration.comments);
    contents.push(format!("{keyword} interface {} {{", declaration.name));
    contents.indent();

    for member in &declaration.members {
        push_leading(contents, &member.comments);
        contents.push(with_trailing(render_member(member, scope, options), &member.comments));
    }

    contents.dedent();
    contents.push("}");
}

fn render_member(member: &Member, scope: &[String], options: &GeneratorOptions) -> String {
    let name = &member.name;

    match &member.shape {
        MemberShape::Property(type_expr) => format!(
            "{name}{}: {};",
            if member.optional { "?" } else { "" },
            type_expr.render(scope, options)
        ),

        MemberShape::Call { input, output } => format!(
            "{name}: (r:{}) => {};",
            input.render(scope, options),
            output.render(scope, options)
        ),
    }
}

fn push_leading(contents: &mut StringBuilder, comments: &Comments) {
    let Some(leading) = &comments.leading else {
        return;
    };

    for line in leading.trim_end().split('\n') {
        let line = line.strip_prefix(' ').unwrap_or(line).trim_end();

        if line.is_empty() {
            contents.push("//");
        } else {
            contents.push(format!("// {line}"));
        }
    }
}

fn with_trailing(line: String, comments: &Comments) -> String {
    let Some(trailing) = &comments.trailing else {
        return line;
    };

    let trailing = trailing
        .split('\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if trailing.is_empty() {
        line
    } else {
        format!("{line} // {trailing}")
    }
}
